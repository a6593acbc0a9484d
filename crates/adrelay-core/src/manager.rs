//! Ad manager facade.
//!
//! [`AdManager`] is the inbound API used by the host dispatch layer. It owns
//! the registry, the provider set and the producer side of the event pipeline.
//! Provider calls are never made while a handle lock is held.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::ad_type::AdType;
use crate::bridge::{self, AttachOutcome, ViewContainer};
use crate::callbacks::{AdCallbacks, ProviderSignal};
use crate::config::{CoreConfig, PlatformDefaults};
use crate::controller::{self, FollowUp, ShowPlan};
use crate::error::{AdError, ConfigurationError, Result};
use crate::handle::{AdId, HandleSnapshot};
use crate::native::{NativeAdProvider, NativeAdRef, ProviderSet};
use crate::options::RequestOptions;
use crate::pipeline::{EventPipeline, EventStream, PipelineStats};
use crate::registry::{self, HandleRegistry, HandleRef};

/// State shared between the manager and outstanding callbacks.
pub(crate) struct Core {
    registry: HandleRegistry,
    providers: ProviderSet,
    pipeline: EventPipeline,
    defaults: PlatformDefaults,
}

impl Core {
    /// Entry point for every provider callback.
    pub(crate) fn on_signal(
        self: &Arc<Self>,
        ad_id: &str,
        ad_type: AdType,
        cycle: u64,
        signal: ProviderSignal,
    ) {
        let Some(slot) = self.registry.get(ad_id) else {
            self.discard(ad_id, ad_type, signal, "handle removed");
            return;
        };

        let follow = {
            let mut handle = slot.lock();
            if handle.is_disposed() || handle.cycle() != cycle {
                drop(handle);
                self.discard(ad_id, ad_type, signal, "stale load cycle");
                return;
            }
            controller::apply(&mut handle, signal, &self.pipeline)
        };

        self.run_follow_up(ad_id, ad_type, cycle, follow);
    }

    /// Drop a late signal, releasing any native ads it carried.
    fn discard(&self, ad_id: &str, ad_type: AdType, signal: ProviderSignal, why: &str) {
        debug!(ad_id = %ad_id, signal = signal.name(), "callback dropped: {}", why);
        self.pipeline.record_dropped();
        let natives = signal.into_natives();
        if !natives.is_empty() {
            self.release(ad_type, natives);
        }
    }

    fn run_follow_up(self: &Arc<Self>, ad_id: &str, ad_type: AdType, cycle: u64, follow: FollowUp) {
        if !follow.release.is_empty() {
            self.release(ad_type, follow.release);
        }

        let Some(native) = follow.render else {
            return;
        };
        let Some(provider) = self.providers.get(ad_type.family()) else {
            return;
        };
        let callbacks = self.callbacks(ad_id, ad_type, cycle);
        if let Err(e) = provider.render(&native, callbacks) {
            self.on_signal(
                ad_id,
                ad_type,
                cycle,
                ProviderSignal::RenderFailed {
                    code: e.code,
                    message: e.message,
                },
            );
        }
    }

    fn release(&self, ad_type: AdType, natives: Vec<NativeAdRef>) {
        let Some(provider) = self.providers.get(ad_type.family()) else {
            return;
        };
        for native in natives {
            if let Err(e) = provider.destroy(native) {
                warn!(ad_type = %ad_type, "failed to destroy native ad: {}", e);
            }
        }
    }

    fn callbacks(self: &Arc<Self>, ad_id: &str, ad_type: AdType, cycle: u64) -> AdCallbacks {
        AdCallbacks::new(ad_id.to_string(), ad_type, cycle, Arc::downgrade(self))
    }

    fn provider_for(&self, ad_type: AdType) -> Option<Arc<dyn NativeAdProvider>> {
        self.providers.get(ad_type.family())
    }
}

/// Manages every live ad and publishes their events.
///
/// Cloning is cheap; clones share the same registry and event stream.
#[derive(Clone)]
pub struct AdManager {
    core: Arc<Core>,
}

impl AdManager {
    /// Create a manager with default configuration.
    pub fn new(providers: ProviderSet) -> (Self, EventStream) {
        Self::with_config(providers, CoreConfig::default())
    }

    /// Create a manager. The returned stream is the single event consumer.
    pub fn with_config(providers: ProviderSet, config: CoreConfig) -> (Self, EventStream) {
        let (pipeline, stream) = EventPipeline::channel();
        info!(providers = ?providers, "ad manager created");
        let manager = Self {
            core: Arc::new(Core {
                registry: HandleRegistry::new(),
                providers,
                pipeline,
                defaults: config.defaults,
            }),
        };
        (manager, stream)
    }

    /// Generate a fresh ad id.
    pub fn new_ad_id(&self) -> AdId {
        registry::new_ad_id()
    }

    /// Request an ad. Returns the ad id once the request is accepted; the
    /// outcome arrives later as events.
    pub fn load(
        &self,
        ad_id: Option<AdId>,
        ad_type: AdType,
        placement_id: &str,
        options: &RequestOptions,
    ) -> Result<AdId> {
        let placement_id = placement_id.trim();
        if placement_id.is_empty() {
            return Err(ConfigurationError::EmptyPlacement.into());
        }
        let provider = self
            .core
            .provider_for(ad_type)
            .ok_or(ConfigurationError::NoProvider(ad_type))?;
        let ad_id = match ad_id {
            Some(id) if id.trim().is_empty() => return Err(ConfigurationError::EmptyAdId.into()),
            Some(id) => id,
            None => registry::new_ad_id(),
        };

        let slot = self.core.registry.insert(ad_id.clone(), ad_type, placement_id)?;
        let cycle = slot.lock().cycle();
        let request = controller::build_request(ad_type, placement_id, options, &self.core.defaults);

        info!(
            ad_id = %ad_id,
            ad_type = %ad_type,
            placement_id = %placement_id,
            provider = provider.name(),
            "loading ad"
        );
        provider.request(request, self.core.callbacks(&ad_id, ad_type, cycle));
        Ok(ad_id)
    }

    /// Load from loosely typed host values.
    pub fn load_raw(
        &self,
        ad_id: Option<AdId>,
        ad_type: &str,
        placement_id: &str,
        options: &serde_json::Value,
    ) -> Result<AdId> {
        let ad_type: AdType = ad_type.parse()?;
        self.load(ad_id, ad_type, placement_id, &RequestOptions::from_value(options))
    }

    /// Present a loaded ad. Failures arrive as `Failed` events; an unknown
    /// id is a silent no-op.
    pub fn show(&self, ad_id: &str) -> Result<()> {
        if ad_id.trim().is_empty() {
            return Err(ConfigurationError::EmptyAdId.into());
        }
        let Some(slot) = self.live(ad_id) else {
            return Ok(());
        };

        let (ad_type, cycle, plan) = {
            let mut handle = slot.lock();
            if handle.is_disposed() {
                return Ok(());
            }
            match controller::plan_show(&handle) {
                Ok(plan) => (handle.ad_type(), handle.cycle(), plan),
                Err(err) => {
                    controller::reject_show(&self.core.pipeline, &mut handle, &err);
                    return Ok(());
                }
            }
        };
        let Some(provider) = self.core.provider_for(ad_type) else {
            return Ok(());
        };

        match plan {
            ShowPlan::ViewDriven => {
                debug!(ad_id = %ad_id, "show on a view-driven ad, visibility follows attachment");
                return Ok(());
            }
            ShowPlan::CheckReady(native) => {
                if !provider.is_ready(&native) {
                    let mut handle = slot.lock();
                    if !handle.is_disposed() {
                        let err = controller::not_ready(&handle);
                        controller::reject_show(&self.core.pipeline, &mut handle, &err);
                    }
                    return Ok(());
                }
            }
            ShowPlan::Present => {}
        }

        let (native, host) = {
            let mut handle = slot.lock();
            if handle.is_disposed() {
                return Ok(());
            }
            match controller::begin_show(&mut handle) {
                Ok(parts) => parts,
                Err(err) => {
                    controller::reject_show(&self.core.pipeline, &mut handle, &err);
                    return Ok(());
                }
            }
        };

        info!(ad_id = %ad_id, ad_type = %ad_type, "showing ad");
        let callbacks = self.core.callbacks(ad_id, ad_type, cycle);
        if let Err(e) = provider.present(&native, host, callbacks) {
            self.core.on_signal(
                ad_id,
                ad_type,
                cycle,
                ProviderSignal::ShowFailed {
                    code: e.code,
                    message: e.message,
                },
            );
        }
        Ok(())
    }

    /// Remove an ad, unmount its view and release the native ad.
    ///
    /// Returns false if the id was not live. Never waits on callbacks.
    /// Events emitted before disposal are still delivered from the stream;
    /// nothing new is emitted for the id once this returns.
    pub fn dispose_ad(&self, ad_id: &str) -> bool {
        let Some(slot) = self.core.registry.remove(ad_id) else {
            debug!(ad_id = %ad_id, "dispose of unknown ad");
            return false;
        };

        let (ad_type, native) = {
            let mut handle = slot.lock();
            handle.mark_disposed();
            bridge::detach(&mut handle);
            (handle.ad_type(), handle.take_native())
        };

        if let Some(native) = native {
            self.core.release(ad_type, vec![native]);
        }
        info!(ad_id = %ad_id, ad_type = %ad_type, "ad disposed");
        true
    }

    /// Dispose every live ad. Returns how many were disposed.
    pub fn clear_all(&self) -> usize {
        let disposed = self
            .core
            .registry
            .list_ids()
            .iter()
            .filter(|id| self.dispose_ad(id))
            .count();
        info!(disposed, "all ads cleared");
        disposed
    }

    /// Attach a host container. Banner and feed surfaces are mounted now if
    /// rendered, otherwise as soon as rendering completes.
    pub fn attach_view(&self, ad_id: &str, container: Arc<dyn ViewContainer>) -> Result<()> {
        if ad_id.trim().is_empty() {
            return Err(ConfigurationError::EmptyAdId.into());
        }
        let Some(slot) = self.live(ad_id) else {
            return Ok(());
        };
        let mut handle = slot.lock();
        if handle.is_disposed() {
            return Ok(());
        }
        let outcome = bridge::attach(&mut handle, &container);
        match outcome {
            AttachOutcome::Mounted => info!(ad_id = %ad_id, "view attached and mounted"),
            AttachOutcome::Deferred => debug!(ad_id = %ad_id, "view attached, mount deferred"),
            AttachOutcome::Stored => debug!(ad_id = %ad_id, "presentation host attached"),
        }
        Ok(())
    }

    /// Unmount and forget the container. The ad itself stays loaded.
    pub fn detach_view(&self, ad_id: &str) {
        let Some(slot) = self.live(ad_id) else {
            return;
        };
        let mut handle = slot.lock();
        if !handle.is_disposed() && bridge::detach(&mut handle) {
            debug!(ad_id = %ad_id, "view detached");
        }
    }

    pub fn snapshot(&self, ad_id: &str) -> Option<HandleSnapshot> {
        self.core.registry.get(ad_id).map(|slot| slot.lock().snapshot())
    }

    pub fn live_count(&self) -> usize {
        self.core.registry.len()
    }

    pub fn contains(&self, ad_id: &str) -> bool {
        self.core.registry.contains(ad_id)
    }

    pub fn stats(&self) -> PipelineStats {
        self.core.pipeline.stats()
    }

    fn live(&self, ad_id: &str) -> Option<HandleRef> {
        let slot = self.core.registry.get(ad_id);
        if slot.is_none() {
            debug!(ad_id = %ad_id, "{}", AdError::StaleHandle(ad_id.to_string()));
        }
        slot
    }
}

impl std::fmt::Debug for AdManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdManager")
            .field("live", &self.core.registry.len())
            .field("providers", &self.core.providers)
            .finish()
    }
}
