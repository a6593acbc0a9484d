//! View container that records what was mounted.

use parking_lot::Mutex;

use adrelay_core::{AdSurface, ViewContainer};

#[derive(Debug, Default)]
pub struct RecordingContainer {
    mounted: Mutex<Vec<String>>,
    mount_calls: Mutex<u32>,
    clear_calls: Mutex<u32>,
}

impl RecordingContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface ids currently mounted.
    pub fn mounted(&self) -> Vec<String> {
        self.mounted.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.mounted.lock().is_empty()
    }

    pub fn mount_calls(&self) -> u32 {
        *self.mount_calls.lock()
    }

    pub fn clear_calls(&self) -> u32 {
        *self.clear_calls.lock()
    }
}

impl ViewContainer for RecordingContainer {
    fn mount(&self, surface: &AdSurface) {
        self.mounted.lock().push(surface.id().to_string());
        *self.mount_calls.lock() += 1;
    }

    fn unmount_all(&self) {
        self.mounted.lock().clear();
        *self.clear_calls.lock() += 1;
    }
}
