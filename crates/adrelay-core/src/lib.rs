//! Ad instance lifecycle and event normalization.
//!
//! Provides:
//! - A concurrent registry of ad handles keyed by ad id
//! - Per-family controllers for splash, reward, fullscreen, banner and feed ads
//! - An ordered event pipeline from provider callback threads to one consumer
//! - View binding for banner and feed ads
//! - Ecpm metadata extraction across native ad variants

pub mod ad_type;
pub mod bridge;
pub mod callbacks;
pub mod config;
mod controller;
pub mod ecpm;
pub mod error;
pub mod event;
pub mod handle;
pub mod logging;
pub mod manager;
pub mod native;
pub mod options;
pub mod pipeline;
pub mod registry;

// Re-exports
pub use ad_type::{AdFamily, AdType, Orientation};

pub use bridge::{AttachOutcome, ViewBinding, ViewContainer};

pub use callbacks::AdCallbacks;

pub use config::{CoreConfig, LogConfig, PlatformDefaults};

pub use ecpm::EcpmInfo;

pub use error::{codes, AdError, ConfigurationError, ProviderError, Result};

pub use event::{AdEvent, AdEventKind, AdEventRecord, CloseInfo, CloseReason, EventType, RewardInfo};

pub use handle::{AdId, AdState, HandleSnapshot};

pub use manager::AdManager;

pub use native::{
    AdSurface, MediationManager, NativeAd, NativeAdProvider, NativeAdRef, ProviderSet,
    RenderableAd,
};

pub use options::{AdRequest, AdSize, RequestOptions, RewardRequest};

pub use pipeline::{AdEventSink, DeliveryHandle, EventPipeline, EventStream, PipelineStats};

pub use registry::HandleRegistry;
