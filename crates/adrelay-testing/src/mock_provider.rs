//! Scriptable mock ad provider.
//!
//! Requests are recorded and their callbacks kept per ad id, so a test can
//! fire provider signals whenever it wants, from any thread.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use adrelay_core::{
    AdCallbacks, AdRequest, NativeAdProvider, NativeAdRef, ProviderError, ViewContainer,
};

/// What `present` does.
#[derive(Debug, Clone, Default)]
pub enum PresentBehavior {
    /// Accept and wait for the test to fire signals
    #[default]
    Accept,
    /// Accept and report `shown` right away
    AutoShow,
    /// Refuse synchronously
    Fail(ProviderError),
}

/// What `render` does.
#[derive(Debug, Clone, Default)]
pub enum RenderBehavior {
    /// Report success synchronously
    #[default]
    Immediate,
    /// Wait for the test to fire `rendered` / `render_failed`
    Manual,
    /// Refuse synchronously
    Fail(ProviderError),
}

#[derive(Default)]
pub struct MockProvider {
    requests: Mutex<Vec<AdRequest>>,
    callbacks: Mutex<HashMap<String, AdCallbacks>>,
    presented: Mutex<Vec<(String, bool)>>,
    ready: AtomicBool,
    present: Mutex<PresentBehavior>,
    render: Mutex<RenderBehavior>,
    destroyed: AtomicUsize,
    rendered: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Arc<Self> {
        let provider = Self::default();
        provider.ready.store(true, Ordering::SeqCst);
        Arc::new(provider)
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn set_present(&self, behavior: PresentBehavior) {
        *self.present.lock() = behavior;
    }

    pub fn set_render(&self, behavior: RenderBehavior) {
        *self.render.lock() = behavior;
    }

    /// Callbacks handed over with the request for `ad_id`.
    pub fn callbacks(&self, ad_id: &str) -> Option<AdCallbacks> {
        self.callbacks.lock().get(ad_id).cloned()
    }

    pub fn requests(&self) -> Vec<AdRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<AdRequest> {
        self.requests.lock().last().cloned()
    }

    /// Ad ids passed to `present`, with whether a host container came along.
    pub fn presented(&self) -> Vec<(String, bool)> {
        self.presented.lock().clone()
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub fn render_calls(&self) -> usize {
        self.rendered.load(Ordering::SeqCst)
    }
}

impl NativeAdProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn request(&self, request: AdRequest, callbacks: AdCallbacks) {
        debug!(ad_id = callbacks.ad_id(), placement_id = %request.placement_id, "mock request");
        self.callbacks
            .lock()
            .insert(callbacks.ad_id().to_string(), callbacks);
        self.requests.lock().push(request);
    }

    fn is_ready(&self, native: &NativeAdRef) -> bool {
        let mediation_ready = native
            .presentable()
            .and_then(|ad| ad.mediation())
            .map(|m| m.is_ready())
            .unwrap_or(true);
        self.ready.load(Ordering::SeqCst) && mediation_ready
    }

    fn present(
        &self,
        _native: &NativeAdRef,
        host: Option<Arc<dyn ViewContainer>>,
        callbacks: AdCallbacks,
    ) -> Result<(), ProviderError> {
        self.presented
            .lock()
            .push((callbacks.ad_id().to_string(), host.is_some()));
        let behavior = self.present.lock().clone();
        match behavior {
            PresentBehavior::Accept => Ok(()),
            PresentBehavior::AutoShow => {
                callbacks.shown();
                Ok(())
            }
            PresentBehavior::Fail(e) => Err(e),
        }
    }

    fn render(&self, _native: &NativeAdRef, callbacks: AdCallbacks) -> Result<(), ProviderError> {
        self.rendered.fetch_add(1, Ordering::SeqCst);
        let behavior = self.render.lock().clone();
        match behavior {
            RenderBehavior::Immediate => {
                callbacks.rendered();
                Ok(())
            }
            RenderBehavior::Manual => Ok(()),
            RenderBehavior::Fail(e) => Err(e),
        }
    }

    fn destroy(&self, native: NativeAdRef) -> Result<(), ProviderError> {
        debug!(family = native.family().name(), "mock destroy");
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
