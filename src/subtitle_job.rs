//! Subtitle generation job
//!
//! Fetches a stored video, has it transcribed and saves the subtitles on the video
//! record. Each step reports its own failure kind so the HTTP layer can answer with
//! a matching status code.

use std::sync::Arc;

use log::{error, info, warn};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{SubtitleFormat, SubtitleRequest};
use crate::repository::{RepositoryError, VideoRepository, VideoStore};
use crate::storage::{FetchError, MediaSource};
use crate::transcription::{TranscriptionError, Transcriber};

/// Failure of one step of a subtitle job
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Video ID and Public ID are required")]
    InvalidInput,

    #[error("Failed to fetch video: {0}")]
    MediaFetch(#[from] FetchError),

    #[error("Transcription failed: {0}")]
    Transcription(#[from] TranscriptionError),

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("Failed to store subtitles: {0}")]
    Persistence(RepositoryError),
}

impl From<RepositoryError> for JobError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::VideoNotFound(id) => JobError::VideoNotFound(id),
            other => JobError::Persistence(other),
        }
    }
}

impl JobError {
    /// Stable identifier of the failure kind
    pub fn reason(&self) -> &'static str {
        match self {
            JobError::InvalidInput => "invalid_input",
            JobError::MediaFetch(_) => "media_fetch_failed",
            JobError::Transcription(_) => "transcription_failed",
            JobError::VideoNotFound(_) => "video_not_found",
            JobError::Persistence(_) => "persistence_failed",
        }
    }
}

/// A request whose identifiers are both present and non-blank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubtitleRequest {
    pub video_id: String,
    pub public_id: String,
}

fn required(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

impl SubtitleRequest {
    pub fn validate(&self) -> Result<ValidSubtitleRequest, JobError> {
        match (required(&self.video_id), required(&self.public_id)) {
            (Some(video_id), Some(public_id)) => Ok(ValidSubtitleRequest {
                video_id,
                public_id,
            }),
            _ => Err(JobError::InvalidInput),
        }
    }
}

/// Result of a successful job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSubtitles {
    pub video_id: String,
    pub subtitles: String,
    pub format: SubtitleFormat,
}

/// Runs subtitle generation against injected collaborators
#[derive(Clone)]
pub struct SubtitleJob {
    media: Arc<dyn MediaSource>,
    transcriber: Arc<dyn Transcriber>,
    store: Arc<dyn VideoStore>,
}

impl SubtitleJob {
    pub fn new(
        media: Arc<dyn MediaSource>,
        transcriber: Arc<dyn Transcriber>,
        store: Arc<dyn VideoStore>,
    ) -> Self {
        Self {
            media,
            transcriber,
            store,
        }
    }

    /// Run the job; the repository is released exactly once whatever the outcome
    pub async fn run(&self, request: &SubtitleRequest) -> Result<GeneratedSubtitles, JobError> {
        let job_id = Uuid::new_v4();
        let repository = self.store.open();

        let outcome = self.execute(job_id, request, repository.as_ref()).await;
        repository.release().await;

        match &outcome {
            Ok(generated) => info!(
                "Job {} stored {} characters of subtitles on video {}",
                job_id,
                generated.subtitles.len(),
                generated.video_id
            ),
            Err(e @ JobError::InvalidInput) => warn!("Job {} rejected: {}", job_id, e),
            Err(e) => error!("Job {} failed ({}): {}", job_id, e.reason(), e),
        }
        outcome
    }

    async fn execute(
        &self,
        job_id: Uuid,
        request: &SubtitleRequest,
        repository: &dyn VideoRepository,
    ) -> Result<GeneratedSubtitles, JobError> {
        let request = request.validate()?;
        info!(
            "Job {} generating subtitles for video {} (media {})",
            job_id, request.video_id, request.public_id
        );

        let media = self.media.fetch_video(&request.public_id).await?;
        let subtitles = self.transcriber.transcribe(media).await?;

        let format = SubtitleFormat::Srt;
        repository
            .attach_subtitles(&request.video_id, &subtitles, format)
            .await?;

        Ok(GeneratedSubtitles {
            video_id: request.video_id,
            subtitles,
            format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeMedia, FakeStore, FakeTranscriber, SAMPLE_SRT};

    fn request(video_id: Option<&str>, public_id: Option<&str>) -> SubtitleRequest {
        SubtitleRequest {
            video_id: video_id.map(String::from),
            public_id: public_id.map(String::from),
        }
    }

    struct Harness {
        media: Arc<FakeMedia>,
        transcriber: Arc<FakeTranscriber>,
        store: Arc<FakeStore>,
        job: SubtitleJob,
    }

    fn harness(media: FakeMedia, transcriber: FakeTranscriber, store: FakeStore) -> Harness {
        let media = Arc::new(media);
        let transcriber = Arc::new(transcriber);
        let store = Arc::new(store);
        let job = SubtitleJob::new(media.clone(), transcriber.clone(), store.clone());
        Harness {
            media,
            transcriber,
            store,
            job,
        }
    }

    #[test]
    fn test_validate_requires_both_fields() {
        assert!(request(Some("v"), Some("p")).validate().is_ok());
        assert!(matches!(
            request(None, Some("p")).validate(),
            Err(JobError::InvalidInput)
        ));
        assert!(matches!(
            request(Some("v"), None).validate(),
            Err(JobError::InvalidInput)
        ));
        assert!(matches!(
            request(Some(""), Some("p")).validate(),
            Err(JobError::InvalidInput)
        ));
        assert!(matches!(
            request(Some("v"), Some("   ")).validate(),
            Err(JobError::InvalidInput)
        ));
    }

    #[tokio::test]
    async fn test_successful_run_stores_subtitles() {
        let h = harness(FakeMedia::ok(), FakeTranscriber::ok(SAMPLE_SRT), FakeStore::with_video("vid_1"));

        let generated = h
            .job
            .run(&request(Some("vid_1"), Some("videos/intro")))
            .await
            .expect("job succeeds");

        assert_eq!(generated.subtitles, SAMPLE_SRT);
        assert_eq!(generated.format, SubtitleFormat::Srt);

        let video = h.store.video("vid_1").expect("video exists");
        assert!(video.has_subtitles);
        assert_eq!(video.subtitle_format.as_deref(), Some("srt"));
        assert_eq!(video.subtitles.as_deref(), Some(SAMPLE_SRT));

        assert_eq!(h.media.calls(), vec!["videos/intro".to_string()]);
        assert_eq!(h.transcriber.files(), vec!["intro.mp4".to_string()]);
        assert_eq!(h.store.releases(), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_makes_no_external_calls() {
        let h = harness(FakeMedia::ok(), FakeTranscriber::ok(SAMPLE_SRT), FakeStore::with_video("vid_1"));

        let err = h.job.run(&request(Some("vid_1"), None)).await.expect_err("must fail");
        assert!(matches!(err, JobError::InvalidInput));
        assert_eq!(err.reason(), "invalid_input");

        assert!(h.media.calls().is_empty());
        assert!(h.transcriber.files().is_empty());
        assert_eq!(h.store.writes(), 0);
        assert_eq!(h.store.releases(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_record_untouched() {
        let h = harness(
            FakeMedia::status(404),
            FakeTranscriber::ok(SAMPLE_SRT),
            FakeStore::with_video("vid_1"),
        );

        let err = h
            .job
            .run(&request(Some("vid_1"), Some("videos/intro")))
            .await
            .expect_err("must fail");
        assert!(matches!(err, JobError::MediaFetch(FetchError::Status(404))));

        let video = h.store.video("vid_1").expect("video exists");
        assert!(!video.has_subtitles);
        assert!(video.subtitles.is_none());
        assert!(h.transcriber.files().is_empty());
        assert_eq!(h.store.releases(), 1);
    }

    #[tokio::test]
    async fn test_transcription_failure() {
        let h = harness(FakeMedia::ok(), FakeTranscriber::failing(500), FakeStore::with_video("vid_1"));

        let err = h
            .job
            .run(&request(Some("vid_1"), Some("videos/intro")))
            .await
            .expect_err("must fail");
        assert_eq!(err.reason(), "transcription_failed");
        assert_eq!(h.store.writes(), 0);
        assert_eq!(h.store.releases(), 1);
    }

    #[tokio::test]
    async fn test_missing_video() {
        let h = harness(FakeMedia::ok(), FakeTranscriber::ok(SAMPLE_SRT), FakeStore::empty());

        let err = h
            .job
            .run(&request(Some("ghost"), Some("videos/intro")))
            .await
            .expect_err("must fail");
        assert!(matches!(err, JobError::VideoNotFound(ref id) if id == "ghost"));
        assert_eq!(h.store.releases(), 1);
    }

    #[tokio::test]
    async fn test_persistence_failure() {
        let h = harness(FakeMedia::ok(), FakeTranscriber::ok(SAMPLE_SRT), FakeStore::unavailable());

        let err = h
            .job
            .run(&request(Some("vid_1"), Some("videos/intro")))
            .await
            .expect_err("must fail");
        assert_eq!(err.reason(), "persistence_failed");
        assert_eq!(h.store.releases(), 1);
    }

    #[tokio::test]
    async fn test_each_run_releases_its_own_repository() {
        let h = harness(FakeMedia::ok(), FakeTranscriber::ok(SAMPLE_SRT), FakeStore::with_video("vid_1"));

        let _ = h.job.run(&request(Some("vid_1"), Some("a"))).await;
        let _ = h.job.run(&request(None, None)).await;
        let _ = h.job.run(&request(Some("ghost"), Some("b"))).await;

        assert_eq!(h.store.opens(), 3);
        assert_eq!(h.store.releases(), 3);
    }
}
