// Subtitle API configuration
//
// This module contains configuration structures and constants for the Subtitle API.
// Every section is read from environment variables once at startup and then passed
// explicitly to the components that need it.

use std::env;
use std::time::Duration;

/// Default values for configuration
pub mod defaults {
    // Server settings
    pub const HOST: &str = "127.0.0.1";
    pub const PORT: u16 = 8080;
    pub const TIMEOUT_SECONDS: u64 = 480;
    pub const KEEPALIVE_SECONDS: u64 = 480;

    // Media delivery host for the storage provider
    pub const DELIVERY_URL: &str = "https://res.cloudinary.com";

    // Transcription provider
    pub const TRANSCRIPTION_BASE_URL: &str = "https://api.openai.com/v1";
    pub const TRANSCRIPTION_MODEL: &str = "whisper-1";
    pub const TRANSCRIPTION_LANGUAGE: &str = "en";

    // Cookie holding the session token
    pub const SESSION_COOKIE_NAME: &str = "__session";

    // Route gate
    pub const LANDING_PATH: &str = "/home";
    pub const SIGN_IN_PATH: &str = "/signin";
    pub const PUBLIC_PAGES: [&str; 4] = ["/signin", "/signup", "/", "/home"];
    pub const PUBLIC_API: [&str; 1] = ["/api/videos"];
}

/// Reads an environment variable, treating empty values as unset
fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_non_empty(key).and_then(|s| s.parse().ok())
}

/// Splits a comma separated list, dropping blank entries
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// HTTP server settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Number of actix workers
    pub workers: usize,
    pub timeout: Duration,
    pub keep_alive: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: env_non_empty("SUBTITLE_API_HOST").unwrap_or_else(|| defaults::HOST.to_string()),
            port: env_parse("SUBTITLE_API_PORT").unwrap_or(defaults::PORT),
            workers: env_parse("HTTP_WORKER_NUMBER")
                .filter(|n: &usize| *n > 0)
                .unwrap_or_else(num_cpus::get),
            timeout: Duration::from_secs(
                env_parse("SUBTITLE_API_TIMEOUT").unwrap_or(defaults::TIMEOUT_SECONDS),
            ),
            keep_alive: Duration::from_secs(
                env_parse("SUBTITLE_API_KEEPALIVE").unwrap_or(defaults::KEEPALIVE_SECONDS),
            ),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Credentials and endpoints of the media storage provider
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    /// Add a delivery signature to every media URL
    pub sign_urls: bool,
    pub delivery_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cloud_name: env_non_empty("CLOUDINARY_CLOUD_NAME")
                .or_else(|| env_non_empty("NEXT_PUBLIC_CLOUDINARY_CLOUD_NAME")),
            api_key: env_non_empty("CLOUDINARY_API_KEY"),
            api_secret: env_non_empty("CLOUDINARY_API_SECRET"),
            sign_urls: env_parse("CLOUDINARY_SIGN_URLS").unwrap_or(false),
            delivery_url: env_non_empty("CLOUDINARY_DELIVERY_URL")
                .unwrap_or_else(|| defaults::DELIVERY_URL.to_string()),
        }
    }
}

impl StorageConfig {
    pub fn is_configured(&self) -> bool {
        self.cloud_name.is_some() && (!self.sign_urls || self.api_secret.is_some())
    }
}

/// Transcription provider settings
#[derive(Clone, Debug)]
pub struct TranscriptionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub language: String,
    /// Zero means the HTTP client default applies
    pub timeout_seconds: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            api_key: env_non_empty("OPENAI_API_KEY"),
            base_url: env_non_empty("OPENAI_BASE_URL")
                .unwrap_or_else(|| defaults::TRANSCRIPTION_BASE_URL.to_string()),
            model: env_non_empty("TRANSCRIPTION_MODEL")
                .unwrap_or_else(|| defaults::TRANSCRIPTION_MODEL.to_string()),
            language: env_non_empty("TRANSCRIPTION_LANGUAGE")
                .unwrap_or_else(|| defaults::TRANSCRIPTION_LANGUAGE.to_string()),
            timeout_seconds: env_parse("TRANSCRIPTION_TIMEOUT_SECONDS").unwrap_or(0),
        }
    }
}

impl TranscriptionConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }
}

/// Persistence settings
#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: env_non_empty("DATABASE_URL"),
        }
    }
}

/// Session token verification settings
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// PEM encoded RSA public key (RS256 tokens)
    pub jwt_public_key: Option<String>,
    /// Shared secret (HS256 tokens)
    pub jwt_secret: Option<String>,
    pub cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            jwt_public_key: env_non_empty("SESSION_JWT_PUBLIC_KEY"),
            jwt_secret: env_non_empty("SESSION_JWT_SECRET"),
            cookie_name: env_non_empty("SESSION_COOKIE_NAME")
                .unwrap_or_else(|| defaults::SESSION_COOKIE_NAME.to_string()),
        }
    }
}

/// Route gate paths and allow-lists
#[derive(Clone, Debug)]
pub struct GateConfig {
    pub landing_path: String,
    pub sign_in_path: String,
    pub public_pages: Vec<String>,
    pub public_api: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            landing_path: env_non_empty("GATE_LANDING_PATH")
                .unwrap_or_else(|| defaults::LANDING_PATH.to_string()),
            sign_in_path: env_non_empty("GATE_SIGN_IN_PATH")
                .unwrap_or_else(|| defaults::SIGN_IN_PATH.to_string()),
            public_pages: env_non_empty("GATE_PUBLIC_PAGES")
                .map(|s| parse_list(&s))
                .unwrap_or_else(|| defaults::PUBLIC_PAGES.iter().map(|s| s.to_string()).collect()),
            public_api: env_non_empty("GATE_PUBLIC_API")
                .map(|s| parse_list(&s))
                .unwrap_or_else(|| defaults::PUBLIC_API.iter().map(|s| s.to_string()).collect()),
        }
    }
}

/// All configuration sections, loaded once at startup
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub transcription: TranscriptionConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub gate: GateConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::default()
    }
}
