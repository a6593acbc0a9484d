//! Per-ad state.
//!
//! Defines the handle record kept in the registry for one ad request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ad_type::AdType;
use crate::bridge::ViewBinding;
use crate::event::AdEventKind;
use crate::native::NativeAdRef;

/// Unique ad identifier.
pub type AdId = String;

/// Ad lifecycle state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AdState {
    /// Created, no request issued yet
    Idle,
    /// Request submitted to the provider
    Loading,
    /// Native ad held and usable
    Loaded,
    /// Render step in progress (banner / feed)
    Rendering,
    /// Presented on screen (splash / reward / fullscreen)
    Showing,
    /// Closed by the user or provider
    Closed,
    /// Load, render or presentation failed
    Failed,
}

impl AdState {
    /// Check if the state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AdState::Closed | AdState::Failed)
    }

    /// Check whether moving to `next` goes forward in the machine.
    pub fn can_transition_to(&self, next: AdState) -> bool {
        use AdState::*;
        matches!(
            (self, next),
            (Idle, Loading)
                | (Loading, Loaded)
                | (Loading, Failed)
                | (Loaded, Rendering)
                | (Loaded, Showing)
                | (Loaded, Closed)
                | (Loaded, Failed)
                | (Rendering, Loaded)
                | (Rendering, Failed)
                | (Showing, Closed)
                | (Showing, Failed)
        )
    }

    /// Get the state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AdState::Idle => "idle",
            AdState::Loading => "loading",
            AdState::Loaded => "loaded",
            AdState::Rendering => "rendering",
            AdState::Showing => "showing",
            AdState::Closed => "closed",
            AdState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for AdState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle record for one ad.
///
/// Only reachable through the registry, behind a per-handle mutex.
#[derive(Debug)]
pub struct AdHandle {
    id: AdId,
    ad_type: AdType,
    placement_id: String,
    state: AdState,
    cycle: u64,
    native: Option<NativeAdRef>,
    view: Option<ViewBinding>,
    rendered: bool,
    shown: bool,
    disposed: bool,
    emitted: u64,
    /// Video and reward events that arrived before the impression
    held: Vec<AdEventKind>,
    created_at: DateTime<Utc>,
}

impl AdHandle {
    pub(crate) fn new(id: AdId, ad_type: AdType, placement_id: String, cycle: u64) -> Self {
        Self {
            id,
            ad_type,
            placement_id,
            state: AdState::Idle,
            cycle,
            native: None,
            view: None,
            rendered: false,
            shown: false,
            disposed: false,
            emitted: 0,
            held: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ad_type(&self) -> AdType {
        self.ad_type
    }

    pub fn placement_id(&self) -> &str {
        &self.placement_id
    }

    pub fn state(&self) -> AdState {
        self.state
    }

    /// Load cycle this handle was created for. Callbacks carry it.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn native(&self) -> Option<&NativeAdRef> {
        self.native.as_ref()
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Number of events emitted for this handle.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Move forward in the state machine. Backward or sideways moves are
    /// refused and leave the state untouched.
    pub(crate) fn transition(&mut self, next: AdState) -> bool {
        if self.state.can_transition_to(next) {
            self.state = next;
            true
        } else {
            false
        }
    }

    /// Store the native reference, returning the one it replaces.
    pub(crate) fn set_native(&mut self, native: NativeAdRef) -> Option<NativeAdRef> {
        self.native.replace(native)
    }

    pub(crate) fn take_native(&mut self) -> Option<NativeAdRef> {
        self.native.take()
    }

    pub(crate) fn view(&self) -> Option<&ViewBinding> {
        self.view.as_ref()
    }

    pub(crate) fn view_mut(&mut self) -> Option<&mut ViewBinding> {
        self.view.as_mut()
    }

    pub(crate) fn set_view(&mut self, binding: ViewBinding) -> Option<ViewBinding> {
        self.view.replace(binding)
    }

    pub(crate) fn take_view(&mut self) -> Option<ViewBinding> {
        self.view.take()
    }

    pub(crate) fn mark_rendered(&mut self) {
        self.rendered = true;
    }

    pub(crate) fn mark_shown(&mut self) {
        self.shown = true;
    }

    /// Keep an event until the impression has been reported.
    pub(crate) fn hold(&mut self, kind: AdEventKind) {
        self.held.push(kind);
    }

    pub(crate) fn take_held(&mut self) -> Vec<AdEventKind> {
        std::mem::take(&mut self.held)
    }

    pub(crate) fn mark_disposed(&mut self) {
        self.disposed = true;
    }

    /// Reserve the next event sequence number.
    pub(crate) fn next_sequence(&mut self) -> u64 {
        self.emitted += 1;
        self.emitted
    }

    pub fn snapshot(&self) -> HandleSnapshot {
        HandleSnapshot {
            ad_id: self.id.clone(),
            ad_type: self.ad_type,
            placement_id: self.placement_id.clone(),
            state: self.state,
            has_native: self.native.is_some(),
            has_view: self.view.as_ref().is_some_and(|v| v.is_alive()),
            view_mounted: self.view.as_ref().is_some_and(|v| v.is_mounted()),
            rendered: self.rendered,
            shown: self.shown,
            events_emitted: self.emitted,
            created_at: self.created_at,
        }
    }
}

/// Read-only view of a handle for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleSnapshot {
    pub ad_id: AdId,
    pub ad_type: AdType,
    pub placement_id: String,
    pub state: AdState,
    pub has_native: bool,
    pub has_view: bool,
    pub view_mounted: bool,
    pub rendered: bool,
    pub shown: bool,
    pub events_emitted: u64,
    pub created_at: DateTime<Utc>,
}
