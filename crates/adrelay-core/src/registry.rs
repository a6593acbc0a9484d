//! Concurrent handle registry.
//!
//! The registry is the only shared mutable structure. Handles live behind a
//! per-handle mutex so callbacks for different ads never contend.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::ad_type::AdType;
use crate::error::ConfigurationError;
use crate::handle::{AdHandle, AdId, AdState};

/// Shared reference to a registered handle.
pub type HandleRef = Arc<Mutex<AdHandle>>;

/// Generate a fresh ad id.
pub fn new_ad_id() -> AdId {
    uuid::Uuid::new_v4().to_string()
}

/// Registry mapping ad ids to handles.
pub struct HandleRegistry {
    handles: DashMap<AdId, HandleRef>,
    /// Load cycle counter; every inserted handle gets a new value.
    next_cycle: AtomicU64,
}

impl HandleRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            handles: DashMap::new(),
            next_cycle: AtomicU64::new(1),
        }
    }

    /// Allocate a fresh id and insert a handle in `Loading` state.
    pub fn create(&self, ad_type: AdType, placement_id: &str) -> AdId {
        loop {
            let id = new_ad_id();
            if self.insert(id.clone(), ad_type, placement_id).is_ok() {
                return id;
            }
        }
    }

    /// Insert a handle under a caller-chosen id.
    ///
    /// Fails if a live handle already uses the id.
    pub fn insert(
        &self,
        id: AdId,
        ad_type: AdType,
        placement_id: &str,
    ) -> Result<HandleRef, ConfigurationError> {
        match self.handles.entry(id) {
            Entry::Occupied(entry) => Err(ConfigurationError::DuplicateAdId(entry.key().clone())),
            Entry::Vacant(entry) => {
                let cycle = self.next_cycle.fetch_add(1, Ordering::Relaxed);
                let mut handle =
                    AdHandle::new(entry.key().clone(), ad_type, placement_id.to_string(), cycle);
                handle.transition(AdState::Loading);
                let slot = Arc::new(Mutex::new(handle));
                entry.insert(slot.clone());
                Ok(slot)
            }
        }
    }

    /// Look up a handle.
    pub fn get(&self, id: &str) -> Option<HandleRef> {
        self.handles.get(id).map(|entry| entry.value().clone())
    }

    /// Remove a handle. At most one caller gets it back for a given id.
    pub fn remove(&self, id: &str) -> Option<HandleRef> {
        self.handles.remove(id).map(|(_, slot)| slot)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handles.contains_key(id)
    }

    /// Snapshot of the live ids.
    pub fn list_ids(&self) -> Vec<AdId> {
        self.handles.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_create_and_get() {
        let registry = HandleRegistry::new();
        let id = registry.create(AdType::Reward, "p1");
        let slot = registry.get(&id).unwrap();
        let handle = slot.lock();
        assert_eq!(handle.state(), AdState::Loading);
        assert_eq!(handle.placement_id(), "p1");
    }

    #[test]
    fn test_duplicate_live_id_rejected() {
        let registry = HandleRegistry::new();
        registry.insert("a".to_string(), AdType::Banner, "p").unwrap();
        let err = registry.insert("a".to_string(), AdType::Banner, "p").unwrap_err();
        assert_eq!(err, ConfigurationError::DuplicateAdId("a".to_string()));
    }

    #[test]
    fn test_reinsert_gets_new_cycle() {
        let registry = HandleRegistry::new();
        let first = registry.insert("a".to_string(), AdType::Banner, "p").unwrap();
        registry.remove("a");
        let second = registry.insert("a".to_string(), AdType::Banner, "p").unwrap();
        assert_ne!(first.lock().cycle(), second.lock().cycle());
    }

    #[test]
    fn test_remove_is_exclusive() {
        let registry = HandleRegistry::new();
        let id = registry.create(AdType::Feed, "p");
        assert!(registry.remove(&id).is_some());
        assert!(registry.remove(&id).is_none());
        assert!(registry.get(&id).is_none());
    }

    #[test]
    fn test_concurrent_create_distinct_ids() {
        let registry = Arc::new(HandleRegistry::new());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    (0..100)
                        .map(|_| registry.create(AdType::Splash, "p"))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for t in threads {
            for id in t.join().unwrap() {
                assert!(ids.insert(id));
            }
        }
        assert_eq!(ids.len(), 800);
        assert_eq!(registry.len(), 800);
    }

    #[test]
    fn test_concurrent_remove_single_winner() {
        let registry = Arc::new(HandleRegistry::new());
        let id = registry.create(AdType::Reward, "p");
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let id = id.clone();
                std::thread::spawn(move || registry.remove(&id).is_some())
            })
            .collect();
        let winners = threads
            .into_iter()
            .map(|t| t.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
