// Subtitle API HTTP handlers
//
// This module contains the HTTP handlers for the Subtitle API and the route gate
// middleware that sits in front of them.

pub mod gate;
pub mod routes;

// Re-export handlers for easier access
pub use self::routes::{api_status, generate_subtitles, json_config, list_videos, ServiceStatus};
// Re-export route gate middleware
pub use self::gate::{AuthenticatedUser, RouteGuard};
