// Error handling for Subtitle API
//
// This module defines the errors returned by the HTTP handlers and how each one
// is rendered as a response.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::repository::RepositoryError;
use crate::subtitle_job::JobError;

/// Message returned for every failed subtitle job that is not a client error
pub const SUBTITLE_FAILURE_MESSAGE: &str = "Failed to generate subtitles";

/// Errors that can occur in the Subtitle API handlers
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The request body could not be used
    #[error("Video ID and Public ID are required")]
    InvalidInput,

    /// A subtitle job failed
    #[error(transparent)]
    Job(#[from] JobError),

    /// Listing or reading videos failed
    #[error("Failed to load videos: {0}")]
    Repository(#[from] RepositoryError),
}

impl HandlerError {
    /// Stable identifier of the failure kind, returned to clients
    pub fn reason(&self) -> &'static str {
        match self {
            HandlerError::InvalidInput => "invalid_input",
            HandlerError::Job(e) => e.reason(),
            HandlerError::Repository(_) => "persistence_failed",
        }
    }

    fn public_message(&self) -> String {
        match self {
            HandlerError::InvalidInput | HandlerError::Job(JobError::InvalidInput) => {
                self.to_string()
            }
            HandlerError::Job(_) => SUBTITLE_FAILURE_MESSAGE.to_string(),
            HandlerError::Repository(_) => "Failed to load videos".to_string(),
        }
    }
}

impl ResponseError for HandlerError {
    fn status_code(&self) -> StatusCode {
        match self {
            HandlerError::InvalidInput | HandlerError::Job(JobError::InvalidInput) => {
                StatusCode::BAD_REQUEST
            }
            HandlerError::Job(JobError::VideoNotFound(_)) => StatusCode::NOT_FOUND,
            HandlerError::Job(JobError::MediaFetch(_))
            | HandlerError::Job(JobError::Transcription(_)) => StatusCode::BAD_GATEWAY,
            HandlerError::Job(JobError::Persistence(_)) | HandlerError::Repository(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Details stay in the logs, clients get the generic message and the kind
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.public_message(),
            reason: Some(self.reason().to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FetchError;
    use crate::transcription::TranscriptionError;

    #[test]
    fn test_status_per_failure_kind() {
        let cases: Vec<(HandlerError, StatusCode, &str)> = vec![
            (HandlerError::InvalidInput, StatusCode::BAD_REQUEST, "invalid_input"),
            (
                HandlerError::Job(JobError::InvalidInput),
                StatusCode::BAD_REQUEST,
                "invalid_input",
            ),
            (
                HandlerError::Job(JobError::VideoNotFound("v".to_string())),
                StatusCode::NOT_FOUND,
                "video_not_found",
            ),
            (
                HandlerError::Job(JobError::MediaFetch(FetchError::Status(404))),
                StatusCode::BAD_GATEWAY,
                "media_fetch_failed",
            ),
            (
                HandlerError::Job(JobError::Transcription(TranscriptionError::Provider {
                    status: 500,
                    body: String::new(),
                })),
                StatusCode::BAD_GATEWAY,
                "transcription_failed",
            ),
            (
                HandlerError::Job(JobError::Persistence(RepositoryError::NotConfigured)),
                StatusCode::INTERNAL_SERVER_ERROR,
                "persistence_failed",
            ),
            (
                HandlerError::Repository(RepositoryError::NotConfigured),
                StatusCode::INTERNAL_SERVER_ERROR,
                "persistence_failed",
            ),
        ];

        for (error, status, reason) in cases {
            assert_eq!(error.status_code(), status, "{}", error);
            assert_eq!(error.reason(), reason);
        }
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let error = HandlerError::Job(JobError::Transcription(TranscriptionError::Provider {
            status: 401,
            body: "Incorrect API key provided: sk-secret".to_string(),
        }));
        assert_eq!(error.public_message(), SUBTITLE_FAILURE_MESSAGE);
    }
}
