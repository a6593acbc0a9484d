//! Splash ads: full-screen, presented into a host container on `show()`.

use std::time::Duration;

use super::{FamilyBehavior, Readiness};
use crate::ad_type::{AdFamily, AdType};
use crate::config::PlatformDefaults;
use crate::ecpm;
use crate::options::{AdRequest, AdSize, RequestOptions};

pub(super) static BEHAVIOR: FamilyBehavior = FamilyBehavior {
    family: AdFamily::Splash,
    build_request,
    readiness: Readiness::Loaded,
    render_step: None,
    extract_ecpm: ecpm::splash,
    video_events: false,
    reward_events: false,
    unmount_on_close: true,
};

fn build_request(
    ad_type: AdType,
    placement_id: &str,
    options: &RequestOptions,
    defaults: &PlatformDefaults,
) -> AdRequest {
    let mut request = AdRequest::new(ad_type, placement_id);
    request.size = Some(AdSize {
        width: options.width.unwrap_or(defaults.screen_width),
        height: options.height.unwrap_or(defaults.screen_height),
    });
    request.timeout = Some(Duration::from_millis(
        options.timeout_ms.unwrap_or(defaults.splash_timeout_ms),
    ));
    request.muted = options.muted;
    request.scenario_id = options.scenario_id.clone();
    request
}
