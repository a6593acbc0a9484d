//! Native ad references and the provider capability.
//!
//! The external ad SDK is reached only through [`NativeAdProvider`]. What it
//! hands back is wrapped in a [`NativeAdRef`], one variant per ad family.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::ad_type::AdFamily;
use crate::bridge::ViewContainer;
use crate::callbacks::AdCallbacks;
use crate::ecpm::EcpmInfo;
use crate::error::ProviderError;
use crate::options::AdRequest;

/// Mediation metadata source exposed by a loaded native ad.
pub trait MediationManager: Send + Sync {
    /// Metadata for the ad that won mediation, if known yet.
    fn show_ecpm(&self) -> Option<EcpmInfo>;

    /// Whether the ad can be presented right now.
    fn is_ready(&self) -> bool {
        true
    }
}

/// A native ad object returned by the provider.
pub trait NativeAd: Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;

    fn mediation(&self) -> Option<&dyn MediationManager> {
        None
    }
}

/// A native ad that renders into a host view (banner and feed).
pub trait RenderableAd: Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;

    /// Mountable content. `None` until rendering has produced it.
    fn surface(&self) -> Option<AdSurface>;

    /// Feed ads may only support self-rendering; those cannot be mounted.
    fn is_express(&self) -> bool {
        true
    }

    fn mediation(&self) -> Option<&dyn MediationManager> {
        None
    }
}

/// Opaque mountable content produced by a renderable ad.
#[derive(Clone)]
pub struct AdSurface {
    id: String,
    content: Arc<dyn Any + Send + Sync>,
}

impl AdSurface {
    pub fn new(id: impl Into<String>, content: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            id: id.into(),
            content,
        }
    }

    /// Surface without a payload, identified by id only.
    pub fn empty(id: impl Into<String>) -> Self {
        Self::new(id, Arc::new(()))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.content.downcast_ref()
    }
}

impl fmt::Debug for AdSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdSurface").field("id", &self.id).finish()
    }
}

/// Native ad reference held by exactly one handle.
pub enum NativeAdRef {
    Splash(Arc<dyn NativeAd>),
    Reward(Arc<dyn NativeAd>),
    FullScreen(Arc<dyn NativeAd>),
    Banner(Arc<dyn RenderableAd>),
    Feed(Arc<dyn RenderableAd>),
}

impl NativeAdRef {
    pub fn splash(ad: impl NativeAd) -> Self {
        NativeAdRef::Splash(Arc::new(ad))
    }

    pub fn reward(ad: impl NativeAd) -> Self {
        NativeAdRef::Reward(Arc::new(ad))
    }

    pub fn full_screen(ad: impl NativeAd) -> Self {
        NativeAdRef::FullScreen(Arc::new(ad))
    }

    pub fn banner(ad: impl RenderableAd) -> Self {
        NativeAdRef::Banner(Arc::new(ad))
    }

    pub fn feed(ad: impl RenderableAd) -> Self {
        NativeAdRef::Feed(Arc::new(ad))
    }

    /// Family this reference belongs to.
    pub fn family(&self) -> AdFamily {
        match self {
            NativeAdRef::Splash(_) => AdFamily::Splash,
            NativeAdRef::Reward(_) => AdFamily::Reward,
            NativeAdRef::FullScreen(_) => AdFamily::FullScreen,
            NativeAdRef::Banner(_) => AdFamily::Banner,
            NativeAdRef::Feed(_) => AdFamily::Feed,
        }
    }

    /// Borrow the provider's concrete type.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            NativeAdRef::Splash(ad) | NativeAdRef::Reward(ad) | NativeAdRef::FullScreen(ad) => {
                ad.as_any().downcast_ref()
            }
            NativeAdRef::Banner(ad) | NativeAdRef::Feed(ad) => ad.as_any().downcast_ref(),
        }
    }

    /// Renderable view of banner and feed references.
    pub fn renderable(&self) -> Option<&dyn RenderableAd> {
        match self {
            NativeAdRef::Banner(ad) | NativeAdRef::Feed(ad) => Some(ad.as_ref()),
            _ => None,
        }
    }

    /// Presentable view of splash, reward and fullscreen references.
    pub fn presentable(&self) -> Option<&dyn NativeAd> {
        match self {
            NativeAdRef::Splash(ad) | NativeAdRef::Reward(ad) | NativeAdRef::FullScreen(ad) => {
                Some(ad.as_ref())
            }
            _ => None,
        }
    }

    /// Whether both references point at the same native object.
    pub fn same_object(&self, other: &NativeAdRef) -> bool {
        match (self, other) {
            (NativeAdRef::Splash(a), NativeAdRef::Splash(b))
            | (NativeAdRef::Reward(a), NativeAdRef::Reward(b))
            | (NativeAdRef::FullScreen(a), NativeAdRef::FullScreen(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (NativeAdRef::Banner(a), NativeAdRef::Banner(b))
            | (NativeAdRef::Feed(a), NativeAdRef::Feed(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }

    /// Second reference to the same native object, for provider calls made
    /// after the handle lock is released. Never stored in another handle.
    pub(crate) fn lease(&self) -> NativeAdRef {
        match self {
            NativeAdRef::Splash(ad) => NativeAdRef::Splash(ad.clone()),
            NativeAdRef::Reward(ad) => NativeAdRef::Reward(ad.clone()),
            NativeAdRef::FullScreen(ad) => NativeAdRef::FullScreen(ad.clone()),
            NativeAdRef::Banner(ad) => NativeAdRef::Banner(ad.clone()),
            NativeAdRef::Feed(ad) => NativeAdRef::Feed(ad.clone()),
        }
    }
}

impl fmt::Debug for NativeAdRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeAdRef::{}", self.family().name())
    }
}

/// Capability exposed by the external ad SDK for one ad family.
///
/// Callbacks may be invoked on any thread, at any time, any number of times.
/// Implementations must not call back into the manager synchronously from
/// `destroy`.
pub trait NativeAdProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Submit a load request. Outcomes are reported through `callbacks`.
    fn request(&self, request: AdRequest, callbacks: AdCallbacks);

    /// Readiness check before presentation.
    fn is_ready(&self, native: &NativeAdRef) -> bool {
        native
            .presentable()
            .and_then(|ad| ad.mediation())
            .map(|m| m.is_ready())
            .unwrap_or(true)
    }

    /// Present a splash, reward or fullscreen ad.
    fn present(
        &self,
        native: &NativeAdRef,
        host: Option<Arc<dyn ViewContainer>>,
        callbacks: AdCallbacks,
    ) -> Result<(), ProviderError> {
        let _ = (host, callbacks);
        Err(ProviderError::new(
            "unsupported",
            format!("{} ads cannot be presented", native.family().name()),
        ))
    }

    /// Render a banner or feed ad. Providers without a separate render step
    /// report success immediately.
    fn render(&self, native: &NativeAdRef, callbacks: AdCallbacks) -> Result<(), ProviderError> {
        let _ = native;
        callbacks.rendered();
        Ok(())
    }

    /// Release a native ad.
    fn destroy(&self, native: NativeAdRef) -> Result<(), ProviderError>;
}

/// Provider lookup by family.
#[derive(Clone, Default)]
pub struct ProviderSet {
    providers: HashMap<AdFamily, Arc<dyn NativeAdProvider>>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider for one family, replacing any previous one.
    pub fn register(&mut self, family: AdFamily, provider: Arc<dyn NativeAdProvider>) {
        self.providers.insert(family, provider);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, family: AdFamily, provider: Arc<dyn NativeAdProvider>) -> Self {
        self.register(family, provider);
        self
    }

    /// Register one provider for every family.
    pub fn with_all(mut self, provider: Arc<dyn NativeAdProvider>) -> Self {
        for family in [
            AdFamily::Splash,
            AdFamily::Reward,
            AdFamily::FullScreen,
            AdFamily::Banner,
            AdFamily::Feed,
        ] {
            self.register(family, provider.clone());
        }
        self
    }

    pub fn get(&self, family: AdFamily) -> Option<Arc<dyn NativeAdProvider>> {
        self.providers.get(&family).cloned()
    }

    pub fn families(&self) -> Vec<AdFamily> {
        self.providers.keys().copied().collect()
    }
}

impl fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.providers.iter().map(|(k, v)| (k.name(), v.name())))
            .finish()
    }
}
