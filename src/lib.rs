// Subtitle API Library
//
// This crate provides an HTTP API that generates subtitles for stored videos
// through a transcription provider, behind a session based route gate.

pub mod config;
pub mod config_loader;
pub mod config_validator;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod route_gate;
pub mod session;
pub mod storage;
pub mod subtitle_job;
pub mod transcription;

#[cfg(test)]
pub(crate) mod testing;

// Re-export common types for easier access
pub use config::AppConfig;
pub use error::HandlerError;
pub use handlers::{api_status, generate_subtitles, list_videos, RouteGuard};
pub use models::{ErrorResponse, SubtitleRequest, SubtitleResponse, Video};
pub use route_gate::{GateDecision, RouteGate};
pub use subtitle_job::{JobError, SubtitleJob};
