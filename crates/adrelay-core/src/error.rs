//! Error types for the ad lifecycle core.
//!
//! Only [`ConfigurationError`] is ever returned synchronously from the inbound
//! API. Everything the provider reports after a request was accepted is turned
//! into a `Failed` event through [`AdError::failure_code`] and
//! [`AdError::failure_message`].

use crate::ad_type::AdType;
use crate::handle::AdId;

/// Stable failure codes carried by `Failed` events.
pub mod codes {
    /// `show()` was called before the ad was loaded, or the readiness check failed.
    pub const NOT_READY: &str = "not_ready";
    /// `show()` was called on an ad that is already showing or closed.
    pub const ALREADY_SHOWN: &str = "already_shown";
    /// The provider answered a list request with zero ads.
    pub const EMPTY_AD: &str = "empty_ad";
    /// The provider failed to present an accepted `show()`.
    pub const SHOW_FAILED: &str = "show_failed";
    /// The render step failed without a provider code.
    pub const RENDER_FAILED: &str = "render_failed";
    /// The provider handed back a native reference of another ad family.
    pub const MISMATCHED_AD: &str = "mismatched_ad";
    /// Load failed without a provider code.
    pub const LOAD_FAILED: &str = "load_failed";
}

/// Pre-flight validation failures, rejected before any provider call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("placement id is empty")]
    EmptyPlacement,

    #[error("unknown ad type: {0}")]
    UnknownAdType(String),

    #[error("ad id is empty")]
    EmptyAdId,

    #[error("ad id already in use: {0}")]
    DuplicateAdId(AdId),

    #[error("no provider registered for ad type: {0}")]
    NoProvider(AdType),

    #[error("{operation} is not supported for ad type {ad_type}")]
    UnsupportedOperation {
        ad_type: AdType,
        operation: &'static str,
    },
}

/// Error reported by a native ad provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    /// Provider-specific error code.
    pub code: String,
    /// Human readable message.
    pub message: String,
}

impl ProviderError {
    /// Create a provider error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Ad lifecycle error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdError {
    /// Missing or invalid placement / ad type.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Show attempted before load completion, or the readiness predicate failed.
    #[error("ad is not ready: {reason}")]
    NotReady { code: &'static str, reason: String },

    /// The provider reported a load failure.
    #[error("load failed ({code}): {message}")]
    ProviderLoad { code: String, message: String },

    /// The provider answered successfully but without any ad.
    #[error("provider returned no ad")]
    EmptyResult,

    /// The render step failed after a successful load.
    #[error("render failed ({code}): {message}")]
    Render { code: String, message: String },

    /// The targeted ad id is no longer in the registry.
    #[error("stale ad handle: {0}")]
    StaleHandle(AdId),

    /// A provider call (present / render / destroy) failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl AdError {
    /// Build a not-ready error.
    pub fn not_ready(reason: impl Into<String>) -> Self {
        AdError::NotReady {
            code: codes::NOT_READY,
            reason: reason.into(),
        }
    }

    /// Build an already-shown error.
    pub fn already_shown() -> Self {
        AdError::NotReady {
            code: codes::ALREADY_SHOWN,
            reason: "Ad has already been shown.".to_string(),
        }
    }

    /// Build a load failure, substituting a generic code for blank ones.
    pub fn provider_load(code: impl Into<String>, message: impl Into<String>) -> Self {
        AdError::ProviderLoad {
            code: non_blank(code.into(), codes::LOAD_FAILED),
            message: message.into(),
        }
    }

    /// Build a render failure, substituting a generic code for blank ones.
    pub fn render(code: impl Into<String>, message: impl Into<String>) -> Self {
        AdError::Render {
            code: non_blank(code.into(), codes::RENDER_FAILED),
            message: message.into(),
        }
    }

    /// Build a presentation failure reported by the provider.
    pub fn show_failed(code: impl Into<String>, message: impl Into<String>) -> Self {
        AdError::Provider(ProviderError::new(
            non_blank(code.into(), codes::SHOW_FAILED),
            message,
        ))
    }

    /// Code carried by the `Failed` event for this error.
    pub fn failure_code(&self) -> String {
        match self {
            AdError::Configuration(_) => "invalid_config".to_string(),
            AdError::NotReady { code, .. } => (*code).to_string(),
            AdError::ProviderLoad { code, .. } => code.clone(),
            AdError::EmptyResult => codes::EMPTY_AD.to_string(),
            AdError::Render { code, .. } => code.clone(),
            AdError::StaleHandle(_) => "stale_handle".to_string(),
            AdError::Provider(e) => e.code.clone(),
        }
    }

    /// Message carried by the `Failed` event for this error.
    pub fn failure_message(&self) -> String {
        match self {
            AdError::NotReady { reason, .. } => reason.clone(),
            AdError::ProviderLoad { message, .. } | AdError::Render { message, .. } => {
                message.clone()
            }
            AdError::EmptyResult => "No ad returned.".to_string(),
            AdError::Provider(e) => e.message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether this error is an expected race outcome rather than a failure.
    pub fn is_stale(&self) -> bool {
        matches!(self, AdError::StaleHandle(_))
    }
}

fn non_blank(code: String, fallback: &str) -> String {
    if code.trim().is_empty() {
        fallback.to_string()
    } else {
        code
    }
}

/// Result type for ad operations.
pub type Result<T> = std::result::Result<T, AdError>;
