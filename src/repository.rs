//! Video persistence
//!
//! A [`VideoStore`] hands out one [`VideoRepository`] per request. The repository
//! owns that request's database connection, opened on first use and closed by
//! [`VideoRepository::release`].

use async_trait::async_trait;
use log::{debug, error};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::models::{has_subtitle_text, SubtitleFormat, Video};

const UPDATE_SUBTITLES_SQL: &str = r#"
    UPDATE "Video"
    SET "subtitles" = $2,
        "hasSubtitles" = $3,
        "subtitleFormat" = $4,
        "updatedAt" = CURRENT_TIMESTAMP
    WHERE "id" = $1
"#;

const LIST_VIDEOS_SQL: &str = r#"
    SELECT "id", "title", "description", "publicId", "originalSize", "compressedSize",
           "duration", "subtitles", "hasSubtitles", "subtitleFormat", "createdAt", "updatedAt"
    FROM "Video"
    ORDER BY "createdAt" DESC
"#;

/// Errors raised by the persistence layer
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database is not configured")]
    NotConfigured,

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Per-request access to video records
#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Store subtitle text on the video
    async fn attach_subtitles(
        &self,
        video_id: &str,
        subtitles: &str,
        format: SubtitleFormat,
    ) -> Result<(), RepositoryError>;

    /// All videos, newest first
    async fn list_videos(&self) -> Result<Vec<Video>, RepositoryError>;

    /// Close the connection held by this repository
    async fn release(&self);
}

/// Opens a repository for one request
pub trait VideoStore: Send + Sync {
    fn open(&self) -> Box<dyn VideoRepository>;
}

/// PostgreSQL backed store
#[derive(Clone)]
pub struct PgVideoStore {
    options: Option<PgConnectOptions>,
}

impl PgVideoStore {
    pub fn new(options: Option<PgConnectOptions>) -> Self {
        Self { options }
    }

    /// Parse the connection string; an absent URL yields a store whose calls fail
    pub fn from_url(url: Option<&str>) -> Result<Self, sqlx::Error> {
        let options = url.map(str::parse::<PgConnectOptions>).transpose()?;
        Ok(Self::new(options))
    }

    /// Store for the configured database
    ///
    /// A connection string that does not parse is logged and leaves the store
    /// unconfigured, so persistence calls fail instead of startup.
    pub fn from_config(config: &DatabaseConfig) -> Self {
        match Self::from_url(config.url.as_deref()) {
            Ok(store) => store,
            Err(e) => {
                error!("Invalid DATABASE_URL, video updates will fail: {}", e);
                Self::new(None)
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.options.is_some()
    }
}

impl VideoStore for PgVideoStore {
    fn open(&self) -> Box<dyn VideoRepository> {
        // Lazy: nothing touches the network until the first query
        let pool = self.options.clone().map(|options| {
            PgPoolOptions::new()
                .max_connections(1)
                .min_connections(0)
                .connect_lazy_with(options)
        });
        Box::new(PgVideoRepository { pool })
    }
}

/// Repository holding a single-connection pool for the duration of a request
pub struct PgVideoRepository {
    pool: Option<PgPool>,
}

impl PgVideoRepository {
    fn pool(&self) -> Result<&PgPool, RepositoryError> {
        self.pool.as_ref().ok_or(RepositoryError::NotConfigured)
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    async fn attach_subtitles(
        &self,
        video_id: &str,
        subtitles: &str,
        format: SubtitleFormat,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(UPDATE_SUBTITLES_SQL)
            .bind(video_id)
            .bind(subtitles)
            .bind(has_subtitle_text(subtitles))
            .bind(format.as_str())
            .execute(self.pool()?)
            .await
            .map_err(|e| {
                error!("Failed to store subtitles for video {}: {}", video_id, e);
                RepositoryError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::VideoNotFound(video_id.to_string()));
        }
        Ok(())
    }

    async fn list_videos(&self) -> Result<Vec<Video>, RepositoryError> {
        let videos = sqlx::query_as::<_, Video>(LIST_VIDEOS_SQL)
            .fetch_all(self.pool()?)
            .await?;
        Ok(videos)
    }

    async fn release(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            debug!("Database connection released");
        }
    }
}
