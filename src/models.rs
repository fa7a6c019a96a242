// Subtitle API data models
//
// This module contains the video record and the request and response types
// used across the API.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Subtitle formats the service can store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    Srt,
}

impl SubtitleFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubtitleFormat::Srt => "srt",
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored video, as persisted in the `"Video"` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// Storage identifier of the media at the storage provider
    pub public_id: String,
    pub original_size: String,
    pub compressed_size: String,
    pub duration: String,
    pub subtitles: Option<String>,
    /// True if and only if `subtitles` is non-empty
    pub has_subtitles: bool,
    pub subtitle_format: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Value of `hasSubtitles` for the given subtitle text
pub fn has_subtitle_text(subtitles: &str) -> bool {
    !subtitles.is_empty()
}

impl Video {
    /// Attach subtitle text, keeping the presence flag consistent with the text
    pub fn attach_subtitles(&mut self, subtitles: &str, format: SubtitleFormat, at: NaiveDateTime) {
        self.has_subtitles = has_subtitle_text(subtitles);
        self.subtitles = Some(subtitles.to_string());
        self.subtitle_format = Some(format.as_str().to_string());
        self.updated_at = at;
    }
}

/// Body of a subtitle generation request
///
/// Both fields are optional at the parsing level so that a missing field is
/// reported as a client input error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleRequest {
    pub video_id: Option<String>,
    pub public_id: Option<String>,
}

/// Response for a successful subtitle generation
#[derive(Debug, Serialize, Deserialize)]
pub struct SubtitleResponse {
    pub success: bool,
    pub subtitles: String,
    pub message: String,
}

/// Error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Machine readable failure kind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
