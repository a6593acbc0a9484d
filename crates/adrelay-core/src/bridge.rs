//! View binding.
//!
//! Associates a handle with a host view container. The container is held
//! weakly: the host owns its lifetime and may tear it down at any time.
//! Mounting always clears the container first, so repeated mounts replace
//! content instead of stacking it.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::handle::{AdHandle, AdState};
use crate::native::AdSurface;

/// Host-owned view an ad can be mounted into.
///
/// Called with the ad's handle lock held; implementations must not call back
/// into the manager.
pub trait ViewContainer: Send + Sync {
    fn mount(&self, surface: &AdSurface);

    fn unmount_all(&self);
}

/// Non-owning link from a handle to its container.
pub struct ViewBinding {
    container: Weak<dyn ViewContainer>,
    /// Id of the surface currently mounted, if any.
    mounted: Option<String>,
}

impl ViewBinding {
    pub(crate) fn new(container: &Arc<dyn ViewContainer>) -> Self {
        Self {
            container: Arc::downgrade(container),
            mounted: None,
        }
    }

    /// Upgrade to the container, if the host still has it.
    pub fn container(&self) -> Option<Arc<dyn ViewContainer>> {
        self.container.upgrade()
    }

    pub fn is_alive(&self) -> bool {
        self.container.strong_count() > 0
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some() && self.is_alive()
    }

    pub fn mounted_surface(&self) -> Option<&str> {
        self.mounted.as_deref()
    }

    fn points_to(&self, container: &Arc<dyn ViewContainer>) -> bool {
        std::ptr::addr_eq(self.container.as_ptr(), Arc::as_ptr(container))
    }

    /// Clear the container and mount `surface`. False if the container is gone.
    pub(crate) fn mount(&mut self, surface: &AdSurface) -> bool {
        let Some(container) = self.container.upgrade() else {
            self.mounted = None;
            return false;
        };
        container.unmount_all();
        container.mount(surface);
        self.mounted = Some(surface.id().to_string());
        true
    }

    /// Clear the container, keeping the association. Safe after teardown.
    pub(crate) fn unmount(&mut self) {
        if let Some(container) = self.container.upgrade() {
            container.unmount_all();
        }
        self.mounted = None;
    }
}

impl fmt::Debug for ViewBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewBinding")
            .field("alive", &self.is_alive())
            .field("mounted", &self.mounted)
            .finish()
    }
}

/// Result of attaching a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    /// Surface mounted right away
    Mounted,
    /// Mount deferred until the render step completes
    Deferred,
    /// Stored as the presentation host (splash / reward / fullscreen)
    Stored,
}

/// Associate `container` with the handle, replacing any previous container.
pub(crate) fn attach(handle: &mut AdHandle, container: &Arc<dyn ViewContainer>) -> AttachOutcome {
    let same = handle.view().is_some_and(|b| b.points_to(container));
    if !same {
        if let Some(mut previous) = handle.set_view(ViewBinding::new(container)) {
            previous.unmount();
        }
    }

    if !handle.ad_type().family().is_view_driven() {
        return AttachOutcome::Stored;
    }
    if mount_if_ready(handle) {
        AttachOutcome::Mounted
    } else {
        AttachOutcome::Deferred
    }
}

/// Drop the association, clearing the container. The ad itself is kept.
pub(crate) fn detach(handle: &mut AdHandle) -> bool {
    match handle.take_view() {
        Some(mut binding) => {
            binding.unmount();
            true
        }
        None => false,
    }
}

/// Clear the container but keep the association.
pub(crate) fn unmount(handle: &mut AdHandle) {
    if let Some(binding) = handle.view_mut() {
        binding.unmount();
    }
}

/// Mount a banner or feed surface if rendering finished and a live container
/// is attached.
pub(crate) fn mount_if_ready(handle: &mut AdHandle) -> bool {
    if !handle.ad_type().family().is_view_driven()
        || !handle.is_rendered()
        || handle.state() != AdState::Loaded
    {
        return false;
    }
    let Some(surface) = handle
        .native()
        .and_then(|native| native.renderable())
        .and_then(|ad| ad.surface())
    else {
        return false;
    };
    match handle.view_mut() {
        Some(binding) => binding.mount(&surface),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ad_type::AdType;
    use crate::native::{NativeAdRef, RenderableAd};
    use parking_lot::Mutex;
    use std::any::Any;

    #[derive(Default)]
    struct Recorder {
        mounted: Mutex<Vec<String>>,
        clears: Mutex<u32>,
    }

    impl ViewContainer for Recorder {
        fn mount(&self, surface: &AdSurface) {
            self.mounted.lock().push(surface.id().to_string());
        }

        fn unmount_all(&self) {
            self.mounted.lock().clear();
            *self.clears.lock() += 1;
        }
    }

    struct Card;

    impl RenderableAd for Card {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn surface(&self) -> Option<AdSurface> {
            Some(AdSurface::empty("card"))
        }
    }

    fn rendered_banner() -> AdHandle {
        let mut handle = AdHandle::new("a".to_string(), AdType::Banner, "p".to_string(), 1);
        handle.transition(AdState::Loading);
        handle.transition(AdState::Loaded);
        handle.set_native(NativeAdRef::banner(Card));
        handle.mark_rendered();
        handle
    }

    #[test]
    fn test_attach_after_render_mounts() {
        let mut handle = rendered_banner();
        let recorder = Arc::new(Recorder::default());
        let container: Arc<dyn ViewContainer> = recorder.clone();
        assert_eq!(attach(&mut handle, &container), AttachOutcome::Mounted);
        assert_eq!(*recorder.mounted.lock(), vec!["card".to_string()]);
    }

    #[test]
    fn test_attach_before_render_defers() {
        let mut handle = AdHandle::new("a".to_string(), AdType::Feed, "p".to_string(), 1);
        handle.transition(AdState::Loading);
        let recorder = Arc::new(Recorder::default());
        let container: Arc<dyn ViewContainer> = recorder.clone();
        assert_eq!(attach(&mut handle, &container), AttachOutcome::Deferred);
        assert!(recorder.mounted.lock().is_empty());
    }

    #[test]
    fn test_reattach_moves_content() {
        let mut handle = rendered_banner();
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let c1: Arc<dyn ViewContainer> = first.clone();
        let c2: Arc<dyn ViewContainer> = second.clone();
        attach(&mut handle, &c1);
        attach(&mut handle, &c2);
        assert!(first.mounted.lock().is_empty());
        assert_eq!(*second.mounted.lock(), vec!["card".to_string()]);

        // same container again: still exactly one mount
        attach(&mut handle, &c2);
        assert_eq!(second.mounted.lock().len(), 1);
    }

    #[test]
    fn test_detach_after_container_dropped() {
        let mut handle = rendered_banner();
        let container: Arc<dyn ViewContainer> = Arc::new(Recorder::default());
        attach(&mut handle, &container);
        drop(container);
        assert!(!handle.view().unwrap().is_alive());
        assert!(detach(&mut handle));
        assert!(!detach(&mut handle));
    }

    #[test]
    fn test_presentation_host_is_stored() {
        let mut handle = AdHandle::new("a".to_string(), AdType::Splash, "p".to_string(), 1);
        let recorder = Arc::new(Recorder::default());
        let container: Arc<dyn ViewContainer> = recorder.clone();
        assert_eq!(attach(&mut handle, &container), AttachOutcome::Stored);
        assert!(handle.view().unwrap().container().is_some());
        assert!(recorder.mounted.lock().is_empty());
    }
}
