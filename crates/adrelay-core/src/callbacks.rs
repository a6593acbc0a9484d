//! Provider callback object.
//!
//! An [`AdCallbacks`] is handed to the provider with every request. It
//! captures the ad id, type and load cycle only, never the handle itself.
//! Every call re-resolves the handle through the registry, so callbacks that
//! arrive after disposal find nothing and are dropped.

use std::fmt;
use std::sync::Weak;

use crate::ad_type::AdType;
use crate::event::{CloseInfo, RewardInfo};
use crate::handle::AdId;
use crate::manager::Core;
use crate::native::NativeAdRef;

/// Raw provider signal, before normalization.
#[derive(Debug)]
pub(crate) enum ProviderSignal {
    Loaded(NativeAdRef),
    Cached(Option<NativeAdRef>),
    LoadedList(Vec<NativeAdRef>),
    LoadFailed { code: String, message: String },
    Rendered,
    RenderFailed { code: String, message: String },
    Shown,
    Clicked,
    Closed(CloseInfo),
    Rewarded(RewardInfo),
    VideoCompleted,
    Skipped,
    ShowFailed { code: String, message: String },
}

impl ProviderSignal {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            ProviderSignal::Loaded(_) => "loaded",
            ProviderSignal::Cached(_) => "cached",
            ProviderSignal::LoadedList(_) => "loaded_list",
            ProviderSignal::LoadFailed { .. } => "load_failed",
            ProviderSignal::Rendered => "rendered",
            ProviderSignal::RenderFailed { .. } => "render_failed",
            ProviderSignal::Shown => "shown",
            ProviderSignal::Clicked => "clicked",
            ProviderSignal::Closed(_) => "closed",
            ProviderSignal::Rewarded(_) => "rewarded",
            ProviderSignal::VideoCompleted => "video_completed",
            ProviderSignal::Skipped => "skipped",
            ProviderSignal::ShowFailed { .. } => "show_failed",
        }
    }

    /// Native references carried by the signal, for release when the signal
    /// is discarded.
    pub(crate) fn into_natives(self) -> Vec<NativeAdRef> {
        match self {
            ProviderSignal::Loaded(native) => vec![native],
            ProviderSignal::Cached(native) => native.into_iter().collect(),
            ProviderSignal::LoadedList(natives) => natives,
            _ => Vec::new(),
        }
    }
}

/// Callbacks for one ad request. Cheap to clone; safe to call from any
/// thread, any number of times.
#[derive(Clone)]
pub struct AdCallbacks {
    ad_id: AdId,
    ad_type: AdType,
    cycle: u64,
    core: Weak<Core>,
}

impl AdCallbacks {
    pub(crate) fn new(ad_id: AdId, ad_type: AdType, cycle: u64, core: Weak<Core>) -> Self {
        Self {
            ad_id,
            ad_type,
            cycle,
            core,
        }
    }

    pub fn ad_id(&self) -> &str {
        &self.ad_id
    }

    pub fn ad_type(&self) -> AdType {
        self.ad_type
    }

    /// Load succeeded with a native ad.
    pub fn loaded(&self, native: NativeAdRef) {
        self.deliver(ProviderSignal::Loaded(native));
    }

    /// Ad material cached. May repeat or precede `loaded`.
    pub fn cached(&self, native: Option<NativeAdRef>) {
        self.deliver(ProviderSignal::Cached(native));
    }

    /// Load succeeded with a list of ads (banner / feed).
    pub fn loaded_list(&self, natives: Vec<NativeAdRef>) {
        self.deliver(ProviderSignal::LoadedList(natives));
    }

    pub fn load_failed(&self, code: impl Into<String>, message: impl Into<String>) {
        self.deliver(ProviderSignal::LoadFailed {
            code: code.into(),
            message: message.into(),
        });
    }

    pub fn rendered(&self) {
        self.deliver(ProviderSignal::Rendered);
    }

    pub fn render_failed(&self, code: impl Into<String>, message: impl Into<String>) {
        self.deliver(ProviderSignal::RenderFailed {
            code: code.into(),
            message: message.into(),
        });
    }

    pub fn shown(&self) {
        self.deliver(ProviderSignal::Shown);
    }

    pub fn clicked(&self) {
        self.deliver(ProviderSignal::Clicked);
    }

    pub fn closed(&self, info: CloseInfo) {
        self.deliver(ProviderSignal::Closed(info));
    }

    pub fn rewarded(&self, reward: RewardInfo) {
        self.deliver(ProviderSignal::Rewarded(reward));
    }

    pub fn video_completed(&self) {
        self.deliver(ProviderSignal::VideoCompleted);
    }

    pub fn skipped(&self) {
        self.deliver(ProviderSignal::Skipped);
    }

    pub fn show_failed(&self, code: impl Into<String>, message: impl Into<String>) {
        self.deliver(ProviderSignal::ShowFailed {
            code: code.into(),
            message: message.into(),
        });
    }

    pub(crate) fn deliver(&self, signal: ProviderSignal) {
        match self.core.upgrade() {
            Some(core) => core.on_signal(&self.ad_id, self.ad_type, self.cycle, signal),
            None => tracing::debug!(
                ad_id = %self.ad_id,
                signal = signal.name(),
                "manager gone, callback dropped"
            ),
        }
    }
}

impl fmt::Debug for AdCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdCallbacks")
            .field("ad_id", &self.ad_id)
            .field("ad_type", &self.ad_type)
            .field("cycle", &self.cycle)
            .finish()
    }
}
