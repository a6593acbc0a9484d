//! Banner ads: rendered, then mounted into an attached container.

use super::{FamilyBehavior, Readiness, RenderPlan};
use crate::ad_type::{AdFamily, AdType};
use crate::config::PlatformDefaults;
use crate::ecpm;
use crate::native::NativeAdRef;
use crate::options::{AdRequest, AdSize, RequestOptions};

pub(super) static BEHAVIOR: FamilyBehavior = FamilyBehavior {
    family: AdFamily::Banner,
    build_request,
    readiness: Readiness::ViewDriven,
    render_step: Some(render_plan),
    extract_ecpm: ecpm::banner,
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
        width: options.width.unwrap_or(defaults.banner_width),
        height: options.height.unwrap_or(defaults.banner_height),
    });
    request.ad_count = options.ad_count.unwrap_or(defaults.ad_count).max(1);
    request.muted = options.muted;
    request.scenario_id = options.scenario_id.clone();
    request
}

fn render_plan(_native: &NativeAdRef) -> RenderPlan {
    RenderPlan::Render
}
