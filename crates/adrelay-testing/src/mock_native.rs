//! Mock native ads.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use adrelay_core::{AdFamily, AdSurface, EcpmInfo, MediationManager, NativeAd, NativeAdRef, RenderableAd};

/// Mediation manager with scripted answers.
#[derive(Debug, Default)]
pub struct MockMediation {
    ecpm: Option<EcpmInfo>,
    not_ready: AtomicBool,
}

impl MockMediation {
    pub fn with_ecpm(ecpm: EcpmInfo) -> Self {
        Self {
            ecpm: Some(ecpm),
            not_ready: AtomicBool::new(false),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.not_ready.store(!ready, Ordering::SeqCst);
    }
}

impl MediationManager for MockMediation {
    fn show_ecpm(&self) -> Option<EcpmInfo> {
        self.ecpm.clone()
    }

    fn is_ready(&self) -> bool {
        !self.not_ready.load(Ordering::SeqCst)
    }
}

/// Splash, reward or fullscreen ad.
#[derive(Debug, Default)]
pub struct MockAd {
    pub label: String,
    pub mediation: MockMediation,
}

impl MockAd {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            mediation: MockMediation::default(),
        }
    }

    pub fn with_ecpm(mut self, ecpm: EcpmInfo) -> Self {
        self.mediation = MockMediation::with_ecpm(ecpm);
        self
    }
}

impl NativeAd for MockAd {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn mediation(&self) -> Option<&dyn MediationManager> {
        Some(&self.mediation)
    }
}

/// Banner or feed ad.
#[derive(Debug)]
pub struct MockRenderable {
    pub label: String,
    pub express: bool,
    pub mediation: MockMediation,
}

impl MockRenderable {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            express: true,
            mediation: MockMediation::default(),
        }
    }

    /// Self-rendered feed ad that cannot be mounted.
    pub fn self_rendered(label: impl Into<String>) -> Self {
        Self {
            express: false,
            ..Self::new(label)
        }
    }

    pub fn with_ecpm(mut self, ecpm: EcpmInfo) -> Self {
        self.mediation = MockMediation::with_ecpm(ecpm);
        self
    }
}

impl RenderableAd for MockRenderable {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn surface(&self) -> Option<AdSurface> {
        Some(AdSurface::new(self.label.clone(), Arc::new(self.label.clone())))
    }

    fn is_express(&self) -> bool {
        self.express
    }

    fn mediation(&self) -> Option<&dyn MediationManager> {
        Some(&self.mediation)
    }
}

/// Build a native reference of the given family.
pub fn native_for(family: AdFamily, label: &str) -> NativeAdRef {
    match family {
        AdFamily::Splash => NativeAdRef::splash(MockAd::new(label)),
        AdFamily::Reward => NativeAdRef::reward(MockAd::new(label)),
        AdFamily::FullScreen => NativeAdRef::full_screen(MockAd::new(label)),
        AdFamily::Banner => NativeAdRef::banner(MockRenderable::new(label)),
        AdFamily::Feed => NativeAdRef::feed(MockRenderable::new(label)),
    }
}
