//! Media storage access
//!
//! Builds delivery URLs for media held by the storage provider and downloads the
//! media bytes over HTTP.

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use bytes::Bytes;
use lazy_static::lazy_static;
use log::{debug, info};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use sha1::{Digest, Sha1};
use thiserror::Error;

use crate::config::StorageConfig;

/// Container format requested from the storage provider
pub const VIDEO_FORMAT: &str = "mp4";
pub const VIDEO_MIME_TYPE: &str = "video/mp4";

lazy_static! {
    static ref VERSIONED: Regex = Regex::new(r"^v[0-9]+").expect("static regex");
}

/// Errors raised while retrieving media
#[derive(Error, Debug)]
pub enum FetchError {
    /// Storage provider settings are missing
    #[error("Storage provider is not configured: {0}")]
    NotConfigured(&'static str),

    /// The HTTP request could not be completed
    #[error("Media request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The storage provider answered with a non-success status
    #[error("Media request returned status {0}")]
    Status(u16),
}

/// Media bytes packaged as a named upload
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Bytes,
}

impl MediaFile {
    /// Wrap mp4 bytes, naming the file after the last segment of the storage id
    pub fn mp4(storage_id: &str, bytes: Bytes) -> Self {
        let stem = storage_id.rsplit('/').next().unwrap_or(storage_id);
        Self {
            file_name: format!("{}.{}", stem, VIDEO_FORMAT),
            content_type: VIDEO_MIME_TYPE,
            bytes,
        }
    }
}

/// Retrieves stored videos
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn fetch_video(&self, storage_id: &str) -> Result<MediaFile, FetchError>;
}

/// Delivery URL builder for the storage provider
#[derive(Debug, Clone)]
pub struct CloudinaryUrl {
    delivery_url: String,
    cloud_name: Option<String>,
    api_secret: Option<String>,
    sign: bool,
}

impl CloudinaryUrl {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            delivery_url: config.delivery_url.trim_end_matches('/').to_string(),
            cloud_name: config.cloud_name.clone(),
            api_secret: config.api_secret.clone(),
            sign: config.sign_urls,
        }
    }

    /// URL of a stored video transcoded to `format`
    ///
    /// Layout: `<host>/<cloud>/video/upload/[s--SIG--/][v1/]<id>.<format>`
    pub fn video_url(&self, storage_id: &str, format: &str) -> Result<String, FetchError> {
        let cloud_name = self
            .cloud_name
            .as_deref()
            .ok_or(FetchError::NotConfigured("cloud name"))?;

        let source = format!("{}.{}", storage_id, format);
        let mut segments = vec![
            self.delivery_url.clone(),
            cloud_name.to_string(),
            "video".to_string(),
            "upload".to_string(),
        ];

        if self.sign {
            let secret = self
                .api_secret
                .as_deref()
                .ok_or(FetchError::NotConfigured("api secret"))?;
            segments.push(format!("s--{}--", sign(&source, secret)));
        }

        // Nested ids need an explicit version so the folder is not read as one
        if storage_id.contains('/') && !VERSIONED.is_match(storage_id) {
            segments.push("v1".to_string());
        }

        segments.push(escape_source(&source));
        Ok(segments.join("/"))
    }
}

/// First eight characters of the URL-safe base64 SHA-1 of `source + secret`
fn sign(source: &str, secret: &str) -> String {
    let digest = Sha1::digest(format!("{}{}", source, secret).as_bytes());
    URL_SAFE.encode(digest).chars().take(8).collect()
}

/// Bytes left as-is in the source part of a delivery URL
const SOURCE_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'/')
    .remove(b':');

fn escape_source(source: &str) -> String {
    utf8_percent_encode(source, SOURCE_ESCAPE).to_string()
}

/// Media source backed by the storage provider's delivery network
pub struct CloudinaryMediaSource {
    client: reqwest::Client,
    urls: CloudinaryUrl,
}

impl CloudinaryMediaSource {
    pub fn new(client: reqwest::Client, config: &StorageConfig) -> Self {
        Self {
            client,
            urls: CloudinaryUrl::new(config),
        }
    }
}

#[async_trait]
impl MediaSource for CloudinaryMediaSource {
    async fn fetch_video(&self, storage_id: &str) -> Result<MediaFile, FetchError> {
        let url = self.urls.video_url(storage_id, VIDEO_FORMAT)?;
        debug!("Fetching media from {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        info!("Fetched {} bytes for media {}", bytes.len(), storage_id);
        Ok(MediaFile::mp4(storage_id, bytes))
    }
}
