// API route handlers for Subtitle API
//
// This module contains the route handlers for the Subtitle API.
// It implements the actual HTTP endpoints for the API.

use actix_web::{error::JsonPayloadError, get, post, web, HttpRequest, HttpResponse};
use log::{info, warn};
use serde::Serialize;

use crate::config::AppConfig;
use crate::error::HandlerError;
use crate::handlers::gate::AuthenticatedUser;
use crate::models::{SubtitleRequest, SubtitleResponse};
use crate::repository::VideoStore;
use crate::subtitle_job::SubtitleJob;

/// JSON extractor settings for API bodies
///
/// Bodies are parsed whatever their content type; a body that is not a JSON object
/// with the expected fields is a client input error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .content_type_required(false)
        .error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
            warn!("Rejected request body: {}", err);
            HandlerError::InvalidInput.into()
        })
}

/// Handler for subtitle generation requests
///
/// Downloads the stored video, has it transcribed and saves the subtitles on the
/// video record. Answers `201 Created` with the subtitle text.
#[post("/api/subtitle-generator")]
pub async fn generate_subtitles(
    body: web::Json<SubtitleRequest>,
    job: web::Data<SubtitleJob>,
    user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, HandlerError> {
    if let Some(AuthenticatedUser(user_id)) = &user {
        info!("Subtitle generation requested by {}", user_id);
    }

    let generated = job.run(&body).await?;

    Ok(HttpResponse::Created().json(SubtitleResponse {
        success: true,
        subtitles: generated.subtitles,
        message: "Subtitles generated successfully".to_string(),
    }))
}

/// Handler listing every video, newest first
#[get("/api/videos")]
pub async fn list_videos(store: web::Data<dyn VideoStore>) -> Result<HttpResponse, HandlerError> {
    let repository = store.open();
    let videos = repository.list_videos().await;
    repository.release().await;

    Ok(HttpResponse::Ok().json(videos?))
}

/// Non-secret view of the running configuration
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    server: ServerStatus,
    providers: ProviderStatus,
    gate: GateStatus,
}

#[derive(Debug, Clone, Serialize)]
struct ServerStatus {
    version: &'static str,
    host: String,
    port: u16,
    workers: usize,
    timeout: u64,
    keepalive: u64,
}

#[derive(Debug, Clone, Serialize)]
struct ProviderStatus {
    storage_configured: bool,
    signed_urls: bool,
    transcription_configured: bool,
    transcription_model: String,
    transcription_language: String,
    database_configured: bool,
    sessions_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
struct GateStatus {
    landing_path: String,
    sign_in_path: String,
    public_pages: Vec<String>,
    public_api: Vec<String>,
}

impl ServiceStatus {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            server: ServerStatus {
                version: env!("CARGO_PKG_VERSION"),
                host: config.server.host.clone(),
                port: config.server.port,
                workers: config.server.workers,
                timeout: config.server.timeout.as_secs(),
                keepalive: config.server.keep_alive.as_secs(),
            },
            providers: ProviderStatus {
                storage_configured: config.storage.is_configured(),
                signed_urls: config.storage.sign_urls,
                transcription_configured: config.transcription.api_key.is_some(),
                transcription_model: config.transcription.model.clone(),
                transcription_language: config.transcription.language.clone(),
                database_configured: config.database.url.is_some(),
                sessions_configured: config.session.jwt_public_key.is_some()
                    || config.session.jwt_secret.is_some(),
            },
            gate: GateStatus {
                landing_path: config.gate.landing_path.clone(),
                sign_in_path: config.gate.sign_in_path.clone(),
                public_pages: config.gate.public_pages.clone(),
                public_api: config.gate.public_api.clone(),
            },
        }
    }
}

/// API status endpoint
#[get("/status")]
pub async fn api_status(status: web::Data<ServiceStatus>) -> HttpResponse {
    HttpResponse::Ok().json(status.get_ref())
}
