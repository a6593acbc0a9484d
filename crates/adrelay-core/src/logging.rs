//! Tracing subscriber bootstrap.

use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Logging bootstrap errors.
#[derive(Debug, thiserror::Error)]
pub enum LogInitError {
    #[error("a global tracing subscriber is already installed: {0}")]
    AlreadyInstalled(String),
}

/// Normalize a level name; unknown names fall back to `info`.
pub fn normalize_level(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => "info",
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Returns `Ok(false)` when logging
/// is disabled in the config.
pub fn init_tracing(config: &LogConfig) -> Result<bool, LogInitError> {
    if !config.enabled {
        return Ok(false);
    }

    let level = normalize_level(&config.level);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("adrelay_core={level},{level}")));

    let result = if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_thread_ids(false)
            .compact()
            .try_init()
    };

    result
        .map(|_| true)
        .map_err(|e| LogInitError::AlreadyInstalled(e.to_string()))
}
