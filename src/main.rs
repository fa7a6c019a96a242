use std::io;
use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{error, info, warn};

use subtitle_api::config::AppConfig;
use subtitle_api::config_loader::{config_file_path, load_config};
use subtitle_api::config_validator::SubtitleConfigValidator;
use subtitle_api::handlers::{
    api_status, generate_subtitles, json_config, list_videos, RouteGuard, ServiceStatus,
};
use subtitle_api::repository::{PgVideoStore, VideoStore};
use subtitle_api::route_gate::RouteGate;
use subtitle_api::session::{JwtSessionProvider, SessionProvider};
use subtitle_api::storage::{CloudinaryMediaSource, MediaSource};
use subtitle_api::subtitle_job::SubtitleJob;
use subtitle_api::transcription::{Transcriber, WhisperTranscriber};

fn startup_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, e);
    io::Error::new(io::ErrorKind::InvalidInput, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    if std::env::args().any(|arg| arg == "--sample-config") {
        print!("{}", SubtitleConfigValidator::generate_sample_config());
        return Ok(());
    }

    // Initialize logger
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Load configuration file, environment variables take precedence
    if !load_config() {
        info!(
            "No configuration file loaded from {}, using environment variables and defaults",
            config_file_path().display()
        );
    }

    match SubtitleConfigValidator::validate_all() {
        Ok(results) => results.print_summary(),
        Err(results) => {
            results.print_summary();
            return Err(startup_error(
                "Invalid configuration",
                format!("{} error(s)", results.errors.len()),
            ));
        }
    }

    let config = AppConfig::from_env();

    // Providers
    let client = reqwest::Client::new();
    if !config.storage.is_configured() {
        warn!("Storage provider is not configured, subtitle generation will fail");
    }
    if config.transcription.api_key.is_none() {
        warn!("Transcription API key is not set, subtitle generation will fail");
    }
    let media: Arc<dyn MediaSource> =
        Arc::new(CloudinaryMediaSource::new(client.clone(), &config.storage));
    let transcriber: Arc<dyn Transcriber> =
        Arc::new(WhisperTranscriber::new(client, config.transcription.clone()));

    let store = PgVideoStore::from_config(&config.database);
    if config.database.url.is_none() {
        warn!("DATABASE_URL is not set, video updates will fail");
    }
    let store: Arc<dyn VideoStore> = Arc::new(store);

    let job = SubtitleJob::new(media, transcriber, store.clone());

    // Route gate
    let gate = RouteGate::from_config(&config.gate)
        .map_err(|e| startup_error("Invalid route gate pattern", e))?;
    let sessions: Arc<dyn SessionProvider> = Arc::new(
        JwtSessionProvider::from_config(&config.session)
            .map_err(|e| startup_error("Invalid session key", e))?,
    );
    let guard = RouteGuard::new(gate, sessions, &config.session.cookie_name);

    let status = web::Data::new(ServiceStatus::from_config(&config));
    let job = web::Data::new(job);
    let store = web::Data::from(store);

    let server = config.server.clone();
    info!("Starting Subtitle API server on http://{}", server.bind_address());
    info!("Transcription model: {}", config.transcription.model);
    info!("HTTP workers: {}", server.workers);

    HttpServer::new(move || {
        App::new()
            .wrap(guard.clone())
            .wrap(Logger::default())
            .app_data(json_config())
            .app_data(job.clone())
            .app_data(store.clone())
            .app_data(status.clone())
            .service(generate_subtitles)
            .service(list_videos)
            .service(api_status)
    })
    .workers(server.workers)
    .bind(server.bind_address())?
    .client_disconnect_timeout(server.timeout)
    .keep_alive(server.keep_alive)
    .run()
    .await
}
