//! Fullscreen video and interstitial ads.

use super::{FamilyBehavior, Readiness};
use crate::ad_type::{AdFamily, AdType};
use crate::config::PlatformDefaults;
use crate::ecpm;
use crate::options::{AdRequest, RequestOptions};

pub(super) static BEHAVIOR: FamilyBehavior = FamilyBehavior {
    family: AdFamily::FullScreen,
    build_request,
    readiness: Readiness::Provider,
    render_step: None,
    extract_ecpm: ecpm::full_screen,
    video_events: true,
    reward_events: false,
    unmount_on_close: false,
};

fn build_request(
    ad_type: AdType,
    placement_id: &str,
    options: &RequestOptions,
    defaults: &PlatformDefaults,
) -> AdRequest {
    let mut request = AdRequest::new(ad_type, placement_id);
    request.orientation = Some(options.orientation.unwrap_or(defaults.orientation));
    request.muted = options.muted;
    request.scenario_id = options.scenario_id.clone();
    request
}
