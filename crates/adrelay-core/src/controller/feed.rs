//! Feed (native express) ads.

use super::{FamilyBehavior, Readiness, RenderPlan};
use crate::ad_type::{AdFamily, AdType};
use crate::config::PlatformDefaults;
use crate::ecpm;
use crate::native::NativeAdRef;
use crate::options::{AdRequest, AdSize, RequestOptions};

pub(super) static BEHAVIOR: FamilyBehavior = FamilyBehavior {
    family: AdFamily::Feed,
    build_request,
    readiness: Readiness::ViewDriven,
    render_step: Some(render_plan),
    extract_ecpm: ecpm::feed,
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
        height: options.height.unwrap_or(defaults.feed_height),
    });
    request.ad_count = options.ad_count.unwrap_or(defaults.ad_count).max(1);
    request.muted = options.muted;
    request.scenario_id = options.scenario_id.clone();
    request
}

fn render_plan(native: &NativeAdRef) -> RenderPlan {
    match native.renderable() {
        Some(ad) if ad.is_express() => RenderPlan::Render,
        Some(_) => RenderPlan::Unsupported("self-rendered feed ads are not supported"),
        None => RenderPlan::Unsupported("not a renderable ad"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_size_and_count() {
        let options = RequestOptions::default().with_ad_count(0);
        let request = build_request(
            AdType::Feed,
            "f1",
            &options,
            &PlatformDefaults::default().with_screen(1080, 2400),
        );
        assert_eq!(request.size, Some(AdSize { width: 1080, height: 720 }));
        assert_eq!(request.ad_count, 1);
    }

    #[test]
    fn test_requested_count_is_kept() {
        let options = RequestOptions::default().with_ad_count(3).with_size(400, 300);
        let request = build_request(AdType::Feed, "f1", &options, &PlatformDefaults::default());
        assert_eq!(request.ad_count, 3);
        assert_eq!(request.size, Some(AdSize { width: 400, height: 300 }));
    }
}
