//! Normalized request options and the provider-facing request.
//!
//! Hosts pass loosely typed key/value maps. They are parsed once into
//! [`RequestOptions`]; controllers then build an [`AdRequest`] per family.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::ad_type::{AdType, Orientation};

/// Nested maps searched after the top level, in order.
const NESTED_KEYS: [&str; 3] = ["extra", "androidOptions", "iosOptions"];

/// Request options recognized by the core. Missing fields fall back to
/// [`PlatformDefaults`](crate::config::PlatformDefaults).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub timeout_ms: Option<u64>,
    pub orientation: Option<Orientation>,
    pub ad_count: Option<u32>,
    pub muted: Option<bool>,
    pub scenario_id: Option<String>,
    pub user_id: Option<String>,
    pub reward_name: Option<String>,
    pub reward_amount: Option<i64>,
}

impl RequestOptions {
    /// Parse from a host map. Unknown keys are ignored and malformed values
    /// are treated as missing.
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };
        let reader = OptionReader { root: map };
        Self {
            width: reader.int("width").and_then(|v| u32::try_from(v).ok()),
            height: reader.int("height").and_then(|v| u32::try_from(v).ok()),
            timeout_ms: reader
                .int("timeoutMs")
                .or_else(|| reader.int("splashTimeout"))
                .and_then(|v| u64::try_from(v).ok()),
            orientation: reader.string("orientation").and_then(|s| Orientation::parse(&s)),
            ad_count: reader.int("adCount").and_then(|v| u32::try_from(v).ok()),
            muted: reader.bool("muted"),
            scenario_id: reader.string("scenarioId"),
            user_id: reader.string("userId"),
            reward_name: reader.string("rewardName"),
            reward_amount: reader.int("rewardAmount"),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_ad_count(mut self, count: u32) -> Self {
        self.ad_count = Some(count);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_muted(mut self, muted: bool) -> Self {
        self.muted = Some(muted);
        self
    }

    pub fn with_reward(mut self, name: impl Into<String>, amount: i64) -> Self {
        self.reward_name = Some(name.into());
        self.reward_amount = Some(amount);
        self
    }
}

struct OptionReader<'a> {
    root: &'a Map<String, Value>,
}

impl OptionReader<'_> {
    fn raw(&self, key: &str) -> Option<&Value> {
        if let Some(v) = self.root.get(key).filter(|v| !v.is_null()) {
            return Some(v);
        }
        NESTED_KEYS
            .iter()
            .filter_map(|nested| self.root.get(*nested).and_then(Value::as_object))
            .find_map(|m| m.get(key).filter(|v| !v.is_null()))
    }

    fn int(&self, key: &str) -> Option<i64> {
        match self.raw(key)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn bool(&self, key: &str) -> Option<bool> {
        match self.raw(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn string(&self, key: &str) -> Option<String> {
        match self.raw(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Accepted ad size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdSize {
    pub width: u32,
    pub height: u32,
}

/// Reward model attached to reward video requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardRequest {
    pub user_id: String,
    pub reward_name: String,
    pub reward_amount: i64,
}

/// Provider-facing request, built by the family's request builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdRequest {
    pub placement_id: String,
    pub ad_type: AdType,
    pub size: Option<AdSize>,
    pub orientation: Option<Orientation>,
    pub ad_count: u32,
    pub timeout: Option<Duration>,
    pub muted: Option<bool>,
    pub scenario_id: Option<String>,
    pub reward: Option<RewardRequest>,
}

impl AdRequest {
    /// Minimal request for a placement; builders fill in the rest.
    pub fn new(ad_type: AdType, placement_id: impl Into<String>) -> Self {
        Self {
            placement_id: placement_id.into(),
            ad_type,
            size: None,
            orientation: None,
            ad_count: 1,
            timeout: None,
            muted: None,
            scenario_id: None,
            reward: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_top_level() {
        let options = RequestOptions::from_value(&json!({
            "width": 300,
            "height": "250",
            "adCount": 3,
            "muted": true,
            "orientation": 2,
            "rewardAmount": "10",
            "unknownKey": "ignored"
        }));
        assert_eq!(options.width, Some(300));
        assert_eq!(options.height, Some(250));
        assert_eq!(options.ad_count, Some(3));
        assert_eq!(options.muted, Some(true));
        assert_eq!(options.orientation, Some(Orientation::Horizontal));
        assert_eq!(options.reward_amount, Some(10));
    }

    #[test]
    fn test_from_value_nested_maps() {
        let options = RequestOptions::from_value(&json!({
            "extra": { "splashTimeout": 5000 },
            "androidOptions": { "width": 640, "scenarioId": "s1" }
        }));
        assert_eq!(options.timeout_ms, Some(5000));
        assert_eq!(options.width, Some(640));
        assert_eq!(options.scenario_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_top_level_wins_over_nested() {
        let options = RequestOptions::from_value(&json!({
            "width": 100,
            "extra": { "width": 200 }
        }));
        assert_eq!(options.width, Some(100));
    }

    #[test]
    fn test_malformed_values_are_missing() {
        let options = RequestOptions::from_value(&json!({
            "width": -5,
            "height": "tall",
            "muted": "maybe",
            "orientation": "diagonal"
        }));
        assert_eq!(options, RequestOptions::default());
    }

    #[test]
    fn test_non_object_is_default() {
        assert_eq!(RequestOptions::from_value(&json!(null)), RequestOptions::default());
        assert_eq!(RequestOptions::from_value(&json!([1, 2])), RequestOptions::default());
    }
}
