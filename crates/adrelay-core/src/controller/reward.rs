//! Reward video ads.

use super::{FamilyBehavior, Readiness};
use crate::ad_type::{AdFamily, AdType};
use crate::config::PlatformDefaults;
use crate::ecpm;
use crate::options::{AdRequest, RequestOptions, RewardRequest};

pub(super) static BEHAVIOR: FamilyBehavior = FamilyBehavior {
    family: AdFamily::Reward,
    build_request,
    readiness: Readiness::Provider,
    render_step: None,
    extract_ecpm: ecpm::reward,
    video_events: true,
    reward_events: true,
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

    // only attach a reward model when the host described one
    if options.user_id.is_some() || options.reward_name.is_some() || options.reward_amount.is_some()
    {
        request.reward = Some(RewardRequest {
            user_id: options.user_id.clone().unwrap_or_default(),
            reward_name: options.reward_name.clone().unwrap_or_default(),
            reward_amount: options.reward_amount.unwrap_or_default(),
        });
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ad_type::Orientation;

    #[test]
    fn test_reward_model() {
        let options = RequestOptions::default().with_reward("gold", 20).with_muted(true);
        let request = build_request(AdType::Reward, "r1", &options, &PlatformDefaults::default());
        let reward = request.reward.unwrap();
        assert_eq!(reward.reward_name, "gold");
        assert_eq!(reward.reward_amount, 20);
        assert_eq!(reward.user_id, "");
        assert_eq!(request.muted, Some(true));
        assert_eq!(request.orientation, Some(Orientation::Vertical));
    }

    #[test]
    fn test_no_reward_model_without_options() {
        let request = build_request(
            AdType::Reward,
            "r1",
            &RequestOptions::default(),
            &PlatformDefaults::default(),
        );
        assert!(request.reward.is_none());
        assert!(request.size.is_none());
    }
}
