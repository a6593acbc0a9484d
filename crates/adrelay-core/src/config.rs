//! Core configuration.
//!
//! Defaults for request options that the host leaves out, plus logging
//! settings. Values can come from environment variables or a JSON document.

use serde::{Deserialize, Serialize};

use crate::ad_type::Orientation;

/// Default values used when request options are missing.
pub mod defaults {
    pub const SCREEN_WIDTH: u32 = 1080;
    pub const SCREEN_HEIGHT: u32 = 1920;
    pub const BANNER_WIDTH: u32 = 320;
    pub const BANNER_HEIGHT: u32 = 150;
    pub const FEED_HEIGHT: u32 = 720;
    pub const SPLASH_TIMEOUT_MS: u64 = 3500;
    pub const AD_COUNT: u32 = 1;
    pub const LOG_LEVEL: &str = "info";
}

/// Environment variable names.
pub mod env_vars {
    pub const SCREEN_WIDTH: &str = "ADRELAY_SCREEN_WIDTH";
    pub const SCREEN_HEIGHT: &str = "ADRELAY_SCREEN_HEIGHT";
    pub const BANNER_WIDTH: &str = "ADRELAY_BANNER_WIDTH";
    pub const BANNER_HEIGHT: &str = "ADRELAY_BANNER_HEIGHT";
    pub const FEED_HEIGHT: &str = "ADRELAY_FEED_HEIGHT";
    pub const SPLASH_TIMEOUT_MS: &str = "ADRELAY_SPLASH_TIMEOUT_MS";
    pub const LOG_ENABLED: &str = "ADRELAY_LOG_ENABLED";
    pub const LOG_LEVEL: &str = "ADRELAY_LOG_LEVEL";
    pub const LOG_JSON: &str = "ADRELAY_LOG_JSON";
}

/// Platform-reasonable fallbacks for size, timeout and count options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlatformDefaults {
    pub screen_width: u32,
    pub screen_height: u32,
    pub banner_width: u32,
    pub banner_height: u32,
    pub feed_height: u32,
    pub splash_timeout_ms: u64,
    pub orientation: Orientation,
    pub ad_count: u32,
}

impl Default for PlatformDefaults {
    fn default() -> Self {
        Self {
            screen_width: defaults::SCREEN_WIDTH,
            screen_height: defaults::SCREEN_HEIGHT,
            banner_width: defaults::BANNER_WIDTH,
            banner_height: defaults::BANNER_HEIGHT,
            feed_height: defaults::FEED_HEIGHT,
            splash_timeout_ms: defaults::SPLASH_TIMEOUT_MS,
            orientation: Orientation::Vertical,
            ad_count: defaults::AD_COUNT,
        }
    }
}

impl PlatformDefaults {
    /// Set the screen size used for full-screen placements.
    pub fn with_screen(mut self, width: u32, height: u32) -> Self {
        self.screen_width = width;
        self.screen_height = height;
        self
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogConfig {
    /// Whether to install a subscriber at all
    pub enabled: bool,
    /// Minimum level: debug, info, warn or error
    pub level: String,
    /// JSON output instead of compact text
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: defaults::LOG_LEVEL.to_string(),
            json: false,
        }
    }
}

/// Top-level configuration for the ad manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoreConfig {
    pub defaults: PlatformDefaults,
    pub log: LogConfig,
}

impl CoreConfig {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let base = PlatformDefaults::default();
        let log = LogConfig::default();
        Self {
            defaults: PlatformDefaults {
                screen_width: env_or(env_vars::SCREEN_WIDTH, base.screen_width),
                screen_height: env_or(env_vars::SCREEN_HEIGHT, base.screen_height),
                banner_width: env_or(env_vars::BANNER_WIDTH, base.banner_width),
                banner_height: env_or(env_vars::BANNER_HEIGHT, base.banner_height),
                feed_height: env_or(env_vars::FEED_HEIGHT, base.feed_height),
                splash_timeout_ms: env_or(env_vars::SPLASH_TIMEOUT_MS, base.splash_timeout_ms),
                ..base
            },
            log: LogConfig {
                enabled: env_or(env_vars::LOG_ENABLED, log.enabled),
                level: std::env::var(env_vars::LOG_LEVEL).unwrap_or(log.level),
                json: env_or(env_vars::LOG_JSON, log.json),
            },
        }
    }

    /// Parse from a JSON value. Missing fields keep their defaults.
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::default();
        assert_eq!(config.defaults.banner_width, 320);
        assert_eq!(config.defaults.banner_height, 150);
        assert_eq!(config.defaults.feed_height, 720);
        assert_eq!(config.defaults.splash_timeout_ms, 3500);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_from_json_partial() {
        let config = CoreConfig::from_json(serde_json::json!({
            "defaults": { "screenWidth": 720, "screenHeight": 1280 },
            "log": { "level": "debug" }
        }))
        .unwrap();
        assert_eq!(config.defaults.screen_width, 720);
        assert_eq!(config.defaults.screen_height, 1280);
        assert_eq!(config.defaults.banner_width, 320);
        assert_eq!(config.log.level, "debug");
        assert!(config.log.enabled);
    }

    #[test]
    fn test_with_screen() {
        let defaults = PlatformDefaults::default().with_screen(100, 200);
        assert_eq!(defaults.screen_width, 100);
        assert_eq!(defaults.screen_height, 200);
    }
}
