//! Configuration loader for Retrato.
//!
//! Reads `retrato.toml` and deserializes it into [`RetratoConfig`]. Falls
//! back to defaults when the file is missing or malformed, so the server can
//! always start with just the API keys in the environment.

use std::path::{Path, PathBuf};

use retrato_types::config::RetratoConfig;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "RETRATO_CONFIG";

/// Config file looked up in the working directory when nothing else is set.
pub const DEFAULT_CONFIG_FILE: &str = "retrato.toml";

/// Pick the config file path.
///
/// Priority:
/// 1. `--config` on the command line
/// 2. `$RETRATO_CONFIG`
/// 3. `./retrato.toml`
pub fn resolve_config_path(cli_path: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_path {
        return path.to_path_buf();
    }
    match std::env::var(CONFIG_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

/// Load configuration from `config_path`.
///
/// - If the file does not exist, returns [`RetratoConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_config(config_path: &Path) -> RetratoConfig {
    let content = match tokio::fs::read_to_string(config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", config_path.display());
            return RetratoConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return RetratoConfig::default();
        }
    };

    match toml::from_str::<RetratoConfig>(&content) {
        Ok(config) => {
            tracing::info!("Loaded configuration from {}", config_path.display());
            config
        }
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            RetratoConfig::default()
        }
    }
}
