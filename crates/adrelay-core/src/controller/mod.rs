//! Per-family ad controllers.
//!
//! Every family is one entry in a static behavior table: request builder,
//! readiness rule, optional render step and ecpm reader. The shared state
//! machine below turns provider signals into normalized events using that
//! table. All functions here run with the handle lock held and never call
//! the provider; provider work is returned as a [`FollowUp`].

mod banner;
mod feed;
mod fullscreen;
mod reward;
mod splash;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::ad_type::{AdFamily, AdType};
use crate::bridge::{self, ViewContainer};
use crate::callbacks::ProviderSignal;
use crate::config::PlatformDefaults;
use crate::ecpm::{self, EcpmReader};
use crate::error::{codes, AdError, ProviderError};
use crate::event::{AdEvent, AdEventKind, CloseInfo};
use crate::handle::{AdHandle, AdState};
use crate::native::NativeAdRef;
use crate::options::{AdRequest, RequestOptions};
use crate::pipeline::EventPipeline;

pub(crate) type RequestBuilder =
    fn(AdType, &str, &RequestOptions, &PlatformDefaults) -> AdRequest;

/// How `show()` decides whether an ad can be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Readiness {
    /// Loaded is enough
    Loaded,
    /// Ask the provider
    Provider,
    /// Visibility follows view attachment; `show()` has nothing to do
    ViewDriven,
}

/// Outcome of a family's render check on a freshly loaded ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RenderPlan {
    Render,
    Unsupported(&'static str),
}

pub(crate) struct FamilyBehavior {
    pub family: AdFamily,
    pub build_request: RequestBuilder,
    pub readiness: Readiness,
    pub render_step: Option<fn(&NativeAdRef) -> RenderPlan>,
    pub extract_ecpm: EcpmReader,
    /// Emits `Completed` / `Skipped`
    pub video_events: bool,
    /// Emits `Rewarded`
    pub reward_events: bool,
    /// Clears the attached container on close
    pub unmount_on_close: bool,
}

/// Behavior table lookup.
pub(crate) fn behavior(family: AdFamily) -> &'static FamilyBehavior {
    match family {
        AdFamily::Splash => &splash::BEHAVIOR,
        AdFamily::Reward => &reward::BEHAVIOR,
        AdFamily::FullScreen => &fullscreen::BEHAVIOR,
        AdFamily::Banner => &banner::BEHAVIOR,
        AdFamily::Feed => &feed::BEHAVIOR,
    }
}

/// Build the provider request for an ad type.
pub(crate) fn build_request(
    ad_type: AdType,
    placement_id: &str,
    options: &RequestOptions,
    defaults: &PlatformDefaults,
) -> AdRequest {
    (behavior(ad_type.family()).build_request)(ad_type, placement_id, options, defaults)
}

/// Provider work to run after the handle lock is released.
#[derive(Debug, Default)]
pub(crate) struct FollowUp {
    /// Start the render step for this reference
    pub render: Option<NativeAdRef>,
    /// References to hand back to the provider's `destroy`
    pub release: Vec<NativeAdRef>,
}

/// Emit an event for the handle, stamping the next sequence number.
pub(crate) fn emit(pipeline: &EventPipeline, handle: &mut AdHandle, kind: AdEventKind) {
    let sequence = handle.next_sequence();
    pipeline.emit(AdEvent {
        ad_id: handle.id().to_string(),
        ad_type: handle.ad_type(),
        placement_id: handle.placement_id().to_string(),
        kind,
        sequence,
        timestamp: Utc::now(),
    });
}

fn emit_failure(pipeline: &EventPipeline, handle: &mut AdHandle, err: &AdError) {
    emit(pipeline, handle, AdEventKind::failed(err));
}

fn ignore(pipeline: &EventPipeline, handle: &AdHandle, signal: &'static str) {
    debug!(
        ad_id = %handle.id(),
        state = %handle.state(),
        signal,
        "signal ignored in current state"
    );
    pipeline.record_dropped();
}

/// Apply one provider signal to a live handle.
pub(crate) fn apply(
    handle: &mut AdHandle,
    signal: ProviderSignal,
    pipeline: &EventPipeline,
) -> FollowUp {
    let behavior = behavior(handle.ad_type().family());
    let mut follow = FollowUp::default();

    match signal {
        ProviderSignal::Loaded(native) | ProviderSignal::Cached(Some(native)) => {
            accept_native(handle, native, behavior, pipeline, &mut follow);
        }
        ProviderSignal::Cached(None) => ignore(pipeline, handle, "cached"),
        ProviderSignal::LoadedList(mut natives) => {
            if natives.is_empty() {
                if handle.state() == AdState::Loading {
                    handle.transition(AdState::Failed);
                    warn!(ad_id = %handle.id(), "provider returned an empty ad list");
                    emit_failure(pipeline, handle, &AdError::EmptyResult);
                } else {
                    ignore(pipeline, handle, "loaded_list");
                }
            } else {
                let first = natives.remove(0);
                if !natives.is_empty() {
                    debug!(ad_id = %handle.id(), extra = natives.len(), "releasing extra ads");
                }
                follow.release.extend(natives);
                accept_native(handle, first, behavior, pipeline, &mut follow);
            }
        }
        ProviderSignal::LoadFailed { code, message } => {
            if handle.state() == AdState::Loading {
                handle.transition(AdState::Failed);
                error!(ad_id = %handle.id(), code = %code, "ad load failed: {}", message);
                emit_failure(pipeline, handle, &AdError::provider_load(code, message));
            } else {
                ignore(pipeline, handle, "load_failed");
            }
        }
        ProviderSignal::Rendered => {
            if handle.state() == AdState::Rendering {
                handle.transition(AdState::Loaded);
                handle.mark_rendered();
                let mounted = bridge::mount_if_ready(handle);
                info!(ad_id = %handle.id(), mounted, "ad rendered");
            } else {
                ignore(pipeline, handle, "rendered");
            }
        }
        ProviderSignal::RenderFailed { code, message } => {
            let failing = match handle.state() {
                AdState::Rendering => true,
                AdState::Loaded => behavior.family == AdFamily::Splash,
                _ => false,
            };
            if failing {
                handle.transition(AdState::Failed);
                error!(ad_id = %handle.id(), code = %code, "ad render failed: {}", message);
                emit_failure(pipeline, handle, &AdError::render(code, message));
            } else {
                ignore(pipeline, handle, "render_failed");
            }
        }
        ProviderSignal::Shown => on_shown(handle, behavior, pipeline),
        ProviderSignal::Clicked => {
            if handle.is_shown() && matches!(handle.state(), AdState::Showing | AdState::Loaded) {
                emit(pipeline, handle, AdEventKind::Clicked);
            } else {
                ignore(pipeline, handle, "clicked");
            }
        }
        ProviderSignal::Closed(info) => on_closed(handle, info, behavior, pipeline),
        ProviderSignal::Rewarded(reward) => {
            if behavior.reward_events && handle.state() == AdState::Showing {
                info!(ad_id = %handle.id(), verified = reward.verified, "reward arrived");
                emit_after_shown(pipeline, handle, AdEventKind::Rewarded(reward));
            } else {
                ignore(pipeline, handle, "rewarded");
            }
        }
        ProviderSignal::VideoCompleted => {
            if behavior.video_events && handle.state() == AdState::Showing {
                emit_after_shown(pipeline, handle, AdEventKind::Completed);
            } else {
                ignore(pipeline, handle, "video_completed");
            }
        }
        ProviderSignal::Skipped => {
            if behavior.video_events && handle.state() == AdState::Showing {
                emit_after_shown(pipeline, handle, AdEventKind::Skipped);
            } else {
                ignore(pipeline, handle, "skipped");
            }
        }
        ProviderSignal::ShowFailed { code, message } => {
            if handle.state() == AdState::Showing {
                handle.transition(AdState::Failed);
                discard_held(pipeline, handle);
                error!(ad_id = %handle.id(), code = %code, "ad show failed: {}", message);
                if behavior.unmount_on_close {
                    bridge::unmount(handle);
                }
                emit_failure(pipeline, handle, &AdError::show_failed(code, message));
            } else {
                ignore(pipeline, handle, "show_failed");
            }
        }
    }

    follow
}

fn accept_native(
    handle: &mut AdHandle,
    native: NativeAdRef,
    behavior: &FamilyBehavior,
    pipeline: &EventPipeline,
    follow: &mut FollowUp,
) {
    if native.family() != behavior.family {
        warn!(
            ad_id = %handle.id(),
            expected = behavior.family.name(),
            got = native.family().name(),
            "provider returned an ad of another family"
        );
        follow.release.push(native);
        if handle.state() == AdState::Loading {
            handle.transition(AdState::Failed);
            let err = AdError::Provider(ProviderError::new(
                codes::MISMATCHED_AD,
                format!("Expected a {} ad.", behavior.family.name()),
            ));
            emit_failure(pipeline, handle, &err);
        }
        return;
    }

    let held_same = handle.native().is_some_and(|held| held.same_object(&native));
    match handle.state() {
        AdState::Loading => {
            handle.set_native(native);
            handle.transition(AdState::Loaded);
            let ecpm = ecpm::extract(handle);
            info!(ad_id = %handle.id(), ad_type = %handle.ad_type(), "ad loaded");
            emit(pipeline, handle, AdEventKind::Loaded { ecpm });

            if let Some(render_step) = behavior.render_step {
                let Some(native) = handle.native() else {
                    return;
                };
                match render_step(native) {
                    RenderPlan::Render => {
                        let lease = native.lease();
                        handle.transition(AdState::Rendering);
                        follow.render = Some(lease);
                    }
                    RenderPlan::Unsupported(reason) => {
                        warn!(ad_id = %handle.id(), "ad cannot be rendered: {}", reason);
                    }
                }
            }
        }
        AdState::Loaded if !held_same => {
            debug!(ad_id = %handle.id(), "repeated load success, native reference updated");
            if let Some(previous) = handle.set_native(native) {
                follow.release.push(previous);
            }
            pipeline.record_dropped();
        }
        _ if held_same => {
            debug!(ad_id = %handle.id(), "repeated load success for the held ad");
            pipeline.record_dropped();
        }
        _ => {
            // in use or finished: keep what we have, give the newcomer back
            ignore(pipeline, handle, "loaded");
            follow.release.push(native);
        }
    }
}

fn on_shown(handle: &mut AdHandle, behavior: &FamilyBehavior, pipeline: &EventPipeline) {
    let visible = if behavior.family.is_view_driven() {
        handle.state() == AdState::Loaded && handle.view().is_some_and(|v| v.is_mounted())
    } else {
        handle.state() == AdState::Showing
    };
    if !visible || handle.is_shown() {
        ignore(pipeline, handle, "shown");
        return;
    }
    handle.mark_shown();
    let ecpm = ecpm::extract(handle);
    info!(ad_id = %handle.id(), ad_type = %handle.ad_type(), "ad shown");
    emit(pipeline, handle, AdEventKind::Shown { ecpm });
    for kind in handle.take_held() {
        emit(pipeline, handle, kind);
    }
}

/// Emit now if the impression is out, otherwise hold until it is.
fn emit_after_shown(pipeline: &EventPipeline, handle: &mut AdHandle, kind: AdEventKind) {
    if handle.is_shown() {
        emit(pipeline, handle, kind);
    } else {
        debug!(ad_id = %handle.id(), event = %kind.event_type(), "held until shown");
        handle.hold(kind);
    }
}

fn discard_held(pipeline: &EventPipeline, handle: &mut AdHandle) {
    for _ in handle.take_held() {
        pipeline.record_dropped();
    }
}

fn on_closed(
    handle: &mut AdHandle,
    info: CloseInfo,
    behavior: &FamilyBehavior,
    pipeline: &EventPipeline,
) {
    let open = if behavior.family.is_view_driven() {
        handle.state() == AdState::Loaded
    } else {
        handle.state() == AdState::Showing
    };
    if !open {
        ignore(pipeline, handle, "closed");
        return;
    }
    handle.transition(AdState::Closed);
    if behavior.unmount_on_close {
        bridge::unmount(handle);
    }
    if handle.is_shown() {
        info!(
            ad_id = %handle.id(),
            reason = info.close_type.as_str(),
            "ad closed"
        );
        emit(pipeline, handle, AdEventKind::Closed(info));
    } else {
        debug!(ad_id = %handle.id(), "closed before shown, not reported");
        pipeline.record_dropped();
        discard_held(pipeline, handle);
    }
}

/// What `show()` should do after the first check.
#[derive(Debug)]
pub(crate) enum ShowPlan {
    /// Banner / feed: visibility follows view attachment
    ViewDriven,
    /// Ask the provider before presenting
    CheckReady(NativeAdRef),
    /// Present right away
    Present,
}

fn ensure_loaded(handle: &AdHandle) -> Result<(), AdError> {
    let name = handle.ad_type().as_str();
    match handle.state() {
        AdState::Loaded => Ok(()),
        AdState::Showing | AdState::Closed => Err(AdError::already_shown()),
        AdState::Failed => Err(AdError::not_ready(format!("{name} ad failed to load."))),
        AdState::Idle | AdState::Loading | AdState::Rendering => {
            Err(AdError::not_ready(format!("{name} ad is not loaded yet.")))
        }
    }
}

/// First `show()` check. Errors become `Failed` events.
pub(crate) fn plan_show(handle: &AdHandle) -> Result<ShowPlan, AdError> {
    ensure_loaded(handle)?;
    match behavior(handle.ad_type().family()).readiness {
        Readiness::ViewDriven => Ok(ShowPlan::ViewDriven),
        Readiness::Loaded => Ok(ShowPlan::Present),
        Readiness::Provider => handle
            .native()
            .map(|native| ShowPlan::CheckReady(native.lease()))
            .ok_or_else(|| AdError::not_ready("Ad is not available.")),
    }
}

pub(crate) fn not_ready(handle: &AdHandle) -> AdError {
    AdError::not_ready(format!("{} ad is not ready.", handle.ad_type().as_str()))
}

/// Move to `Showing` and collect what the provider needs to present.
pub(crate) fn begin_show(
    handle: &mut AdHandle,
) -> Result<(NativeAdRef, Option<Arc<dyn ViewContainer>>), AdError> {
    ensure_loaded(handle)?;
    let native = handle
        .native()
        .map(NativeAdRef::lease)
        .ok_or_else(|| AdError::not_ready("Ad is not available."))?;
    handle.transition(AdState::Showing);
    let host = handle.view().and_then(|binding| binding.container());
    Ok((native, host))
}

/// Emit a `Failed` event for a rejected `show()`.
pub(crate) fn reject_show(pipeline: &EventPipeline, handle: &mut AdHandle, err: &AdError) {
    warn!(
        ad_id = %handle.id(),
        code = %err.failure_code(),
        "show rejected: {}",
        err.failure_message()
    );
    emit_failure(pipeline, handle, err);
}
