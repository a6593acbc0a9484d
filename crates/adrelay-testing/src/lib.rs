//! Testing utilities for adrelay
//!
//! This crate provides:
//! - A scriptable mock ad provider
//! - Mock native ads with configurable readiness and ecpm data
//! - A recording view container
//! - Helpers to collect pipeline events with a timeout

pub mod mock_native;
pub mod mock_provider;
pub mod recording_view;
pub mod test_utils;

pub use mock_native::{native_for, MockAd, MockMediation, MockRenderable};
pub use mock_provider::{MockProvider, PresentBehavior, RenderBehavior};
pub use recording_view::RecordingContainer;
pub use test_utils::{collect_events, expect_no_events, init_test_tracing, sample_ecpm};
