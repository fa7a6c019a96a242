//! Transcription provider client
//!
//! Uploads a media file to a Whisper-compatible transcription API and returns the
//! subtitle text it produces.

use async_trait::async_trait;
use log::{info, warn};
use reqwest::multipart::{Form, Part};
use thiserror::Error;

use crate::config::TranscriptionConfig;
use crate::models::SubtitleFormat;
use crate::storage::MediaFile;

/// Errors raised by the transcription provider
#[derive(Error, Debug)]
pub enum TranscriptionError {
    #[error("Transcription provider is not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Transcription request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider rejected the request; `body` holds its error text
    #[error("Transcription provider returned status {status}: {body}")]
    Provider { status: u16, body: String },
}

/// Turns media into subtitle text
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, media: MediaFile) -> Result<String, TranscriptionError>;
}

/// Client for the `/audio/transcriptions` endpoint of a Whisper API
pub struct WhisperTranscriber {
    client: reqwest::Client,
    config: TranscriptionConfig,
    format: SubtitleFormat,
}

impl WhisperTranscriber {
    pub fn new(client: reqwest::Client, config: TranscriptionConfig) -> Self {
        Self {
            client,
            config,
            format: SubtitleFormat::Srt,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/audio/transcriptions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, media: MediaFile) -> Result<String, TranscriptionError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(TranscriptionError::NotConfigured("api key"))?;

        info!(
            "Transcribing {} ({} bytes) with model {}",
            media.file_name,
            media.bytes.len(),
            self.config.model
        );

        let length = media.bytes.len() as u64;
        let file = Part::stream_with_length(media.bytes, length)
            .file_name(media.file_name)
            .mime_str(media.content_type)?;
        let form = Form::new()
            .part("file", file)
            .text("model", self.config.model.clone())
            .text("response_format", self.format.as_str())
            .text("language", self.config.language.clone());

        let mut request = self.client.post(self.endpoint()).bearer_auth(api_key).multipart(form);
        if let Some(timeout) = self.config.timeout() {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Transcription provider returned {}: {}", status, body);
            return Err(TranscriptionError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let subtitles = response.text().await?;
        info!("Transcription completed: {} characters", subtitles.len());
        Ok(subtitles)
    }
}
