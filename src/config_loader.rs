// Configuration loader for Subtitle API
//
// This module handles loading configuration from the TOML configuration file
// and environment variables with appropriate precedence.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use toml::Value;

const CONFIG_FILE_PATH: &str = "subtitle_api.conf";
const CONFIG_PATH_ENV: &str = "SUBTITLE_API_CONFIG";

/// Path of the configuration file, `SUBTITLE_API_CONFIG` taking precedence
pub fn config_file_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(CONFIG_FILE_PATH))
}

/// Loads configuration from the TOML file and exports it as environment variables
///
/// Configuration precedence (highest to lowest):
/// 1. Environment variables
/// 2. Configuration file values
/// 3. Default values (not handled here - see `config::defaults`)
///
/// Returns true if the config file was successfully loaded, false otherwise
pub fn load_config() -> bool {
    load_config_from(&config_file_path())
}

/// Same as [`load_config`] for an explicit path
pub fn load_config_from(config_path: &Path) -> bool {
    if !config_path.exists() {
        debug!("Configuration file not found at: {}", config_path.display());
        return false;
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read configuration file: {}", e);
            return false;
        }
    };

    let config_map = match parse_flat_config(&config_content) {
        Ok(map) => map,
        Err(e) => {
            warn!("Failed to parse configuration file: {}", e);
            return false;
        }
    };

    for (key, value) in config_map {
        // Never override a variable already set by the environment
        if env::var(&key).is_err() {
            debug!("Setting env var from config file: {}", key);
            env::set_var(key, value);
        } else {
            debug!("Env var already exists, skipping: {}", key);
        }
    }

    info!("Configuration loaded from {}", config_path.display());
    true
}

/// Flattens a TOML document into string key-value pairs
///
/// Arrays of scalars are joined with commas so list settings such as
/// `GATE_PUBLIC_PAGES` can be written naturally. Nested tables are skipped.
pub fn parse_flat_config(content: &str) -> Result<HashMap<String, String>, toml::de::Error> {
    let values: Value = content.parse()?;
    let mut config_map = HashMap::new();

    if let Value::Table(table) = values {
        for (key, value) in table {
            match scalar_to_string(&value) {
                Some(s) => {
                    config_map.insert(key, s);
                }
                None => match value {
                    Value::Array(items) => {
                        let joined: Vec<String> = items.iter().filter_map(scalar_to_string).collect();
                        config_map.insert(key, joined.join(","));
                    }
                    _ => warn!("Skipping unsupported TOML value type for key: {}", key),
                },
            }
        }
    }

    Ok(config_map)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}
