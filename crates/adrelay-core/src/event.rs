//! Normalized ad events.
//!
//! Internally events are structured records. [`AdEvent::to_record`] produces
//! the flat key/value form handed to the host.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ad_type::AdType;
use crate::ecpm::EcpmInfo;
use crate::error::AdError;
use crate::handle::AdId;

/// Event type names on the external stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Loaded,
    Shown,
    Clicked,
    Closed,
    Rewarded,
    Completed,
    Skipped,
    Failed,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Loaded => "loaded",
            EventType::Shown => "shown",
            EventType::Clicked => "clicked",
            EventType::Closed => "closed",
            EventType::Rewarded => "rewarded",
            EventType::Completed => "completed",
            EventType::Skipped => "skipped",
            EventType::Failed => "failed",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an ad was closed. Provider-specific codes are folded into this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Plain close / dismiss
    #[default]
    Dismissed,
    /// User pressed skip
    UserSkip,
    /// Countdown reached zero
    CountdownElapsed,
    /// User clicked through to the landing page
    ClickThrough,
    /// Closed by the system or app
    ForceQuit,
    /// Splash card closed
    CardClose,
    /// User disliked a banner or feed ad
    Dislike,
    /// Anything else
    Other,
}

impl CloseReason {
    /// Normalize a raw provider close code.
    pub fn from_provider(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "close" | "closed" | "dismissed" => CloseReason::Dismissed,
            "click_skip" | "skip" => CloseReason::UserSkip,
            "count_down_over" | "countdown_to_zero" | "countdown" => {
                CloseReason::CountdownElapsed
            }
            "click_jump" | "click_ad" => CloseReason::ClickThrough,
            "force_quit" => CloseReason::ForceQuit,
            "card_close" => CloseReason::CardClose,
            "dislike" => CloseReason::Dislike,
            _ => CloseReason::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::Dismissed => "dismissed",
            CloseReason::UserSkip => "user_skip",
            CloseReason::CountdownElapsed => "countdown_elapsed",
            CloseReason::ClickThrough => "click_through",
            CloseReason::ForceQuit => "force_quit",
            CloseReason::CardClose => "card_close",
            CloseReason::Dislike => "dislike",
            CloseReason::Other => "other",
        }
    }
}

/// Close metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseInfo {
    pub close_type: CloseReason,
    /// Selected dislike value, when the provider reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CloseInfo {
    pub fn new(reason: CloseReason) -> Self {
        Self {
            close_type: reason,
            detail: None,
        }
    }

    pub fn dislike(value: Option<String>) -> Self {
        Self {
            close_type: CloseReason::Dislike,
            detail: value,
        }
    }
}

/// Reward metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardInfo {
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_type: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_id: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl RewardInfo {
    pub fn verified(name: impl Into<String>, amount: i64) -> Self {
        Self {
            verified: true,
            reward_name: Some(name.into()),
            reward_amount: Some(amount),
            ..Default::default()
        }
    }
}

/// Event payload.
#[derive(Debug, Clone, PartialEq)]
pub enum AdEventKind {
    Loaded { ecpm: Option<EcpmInfo> },
    Shown { ecpm: Option<EcpmInfo> },
    Clicked,
    Closed(CloseInfo),
    Rewarded(RewardInfo),
    Completed,
    Skipped,
    Failed { code: String, message: String },
}

impl AdEventKind {
    /// Failed event for a post-flight error.
    pub fn failed(error: &AdError) -> Self {
        AdEventKind::Failed {
            code: error.failure_code(),
            message: error.failure_message(),
        }
    }

    pub fn event_type(&self) -> EventType {
        match self {
            AdEventKind::Loaded { .. } => EventType::Loaded,
            AdEventKind::Shown { .. } => EventType::Shown,
            AdEventKind::Clicked => EventType::Clicked,
            AdEventKind::Closed(_) => EventType::Closed,
            AdEventKind::Rewarded(_) => EventType::Rewarded,
            AdEventKind::Completed => EventType::Completed,
            AdEventKind::Skipped => EventType::Skipped,
            AdEventKind::Failed { .. } => EventType::Failed,
        }
    }
}

/// One normalized event for one ad.
#[derive(Debug, Clone, PartialEq)]
pub struct AdEvent {
    pub ad_id: AdId,
    pub ad_type: AdType,
    pub placement_id: String,
    pub kind: AdEventKind,
    /// Position among the events emitted for this ad, starting at 1
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
}

impl AdEvent {
    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    /// Failure code, present only for failed events.
    pub fn error_code(&self) -> Option<&str> {
        match &self.kind {
            AdEventKind::Failed { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Flatten into the host-facing record.
    pub fn to_record(&self) -> AdEventRecord {
        let (data, error_code, error_message) = match &self.kind {
            AdEventKind::Loaded { ecpm } | AdEventKind::Shown { ecpm } => {
                (ecpm.as_ref().map(ecpm_data), None, None)
            }
            AdEventKind::Closed(info) => (serde_json::to_value(info).ok(), None, None),
            AdEventKind::Rewarded(info) => (serde_json::to_value(info).ok(), None, None),
            AdEventKind::Failed { code, message } => {
                (None, Some(code.clone()), Some(message.clone()))
            }
            AdEventKind::Clicked | AdEventKind::Completed | AdEventKind::Skipped => {
                (None, None, None)
            }
        };
        AdEventRecord {
            ad_id: self.ad_id.clone(),
            ad_type: self.ad_type,
            placement_id: self.placement_id.clone(),
            event_type: self.event_type(),
            data,
            error_code,
            error_message,
            sequence: self.sequence,
            timestamp: self.timestamp.timestamp_millis(),
        }
    }
}

fn ecpm_data(ecpm: &EcpmInfo) -> Value {
    let mut data = Map::new();
    if let Ok(info) = serde_json::to_value(ecpm) {
        data.insert("ecpmInfo".to_string(), info);
    }
    Value::Object(data)
}

/// Serialized event as seen by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdEventRecord {
    pub ad_id: AdId,
    pub ad_type: AdType,
    pub placement_id: String,
    pub event_type: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub sequence: u64,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}
