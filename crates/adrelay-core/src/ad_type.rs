//! Ad type tags.
//!
//! `AdType` is what the host asks for; `AdFamily` is which controller drives it.
//! Fullscreen video and interstitial ads share one family.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfigurationError;

/// Ad type requested by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdType {
    #[serde(rename = "splash")]
    Splash,
    #[serde(rename = "rewardVideo")]
    Reward,
    #[serde(rename = "fullscreenVideo")]
    FullScreen,
    #[serde(rename = "interstitial")]
    Interstitial,
    #[serde(rename = "banner")]
    Banner,
    #[serde(rename = "native")]
    Feed,
}

impl AdType {
    /// All ad types.
    pub const ALL: [AdType; 6] = [
        AdType::Splash,
        AdType::Reward,
        AdType::FullScreen,
        AdType::Interstitial,
        AdType::Banner,
        AdType::Feed,
    ];

    /// Canonical host-facing name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AdType::Splash => "splash",
            AdType::Reward => "rewardVideo",
            AdType::FullScreen => "fullscreenVideo",
            AdType::Interstitial => "interstitial",
            AdType::Banner => "banner",
            AdType::Feed => "native",
        }
    }

    /// Controller family driving this ad type.
    pub fn family(&self) -> AdFamily {
        match self {
            AdType::Splash => AdFamily::Splash,
            AdType::Reward => AdFamily::Reward,
            AdType::FullScreen | AdType::Interstitial => AdFamily::FullScreen,
            AdType::Banner => AdFamily::Banner,
            AdType::Feed => AdFamily::Feed,
        }
    }
}

impl std::fmt::Display for AdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "splash" => Ok(AdType::Splash),
            "rewardVideo" | "reward" => Ok(AdType::Reward),
            "fullscreenVideo" | "fullscreen" => Ok(AdType::FullScreen),
            "interstitial" => Ok(AdType::Interstitial),
            "banner" => Ok(AdType::Banner),
            "native" | "feed" | "draw_native" => Ok(AdType::Feed),
            other => Err(ConfigurationError::UnknownAdType(other.to_string())),
        }
    }
}

/// Controller family. Each family has one entry in the behavior table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdFamily {
    Splash,
    Reward,
    FullScreen,
    Banner,
    Feed,
}

impl AdFamily {
    /// Banner and feed ads are mounted into host views instead of presented.
    pub fn is_view_driven(&self) -> bool {
        matches!(self, AdFamily::Banner | AdFamily::Feed)
    }

    /// Get the family name.
    pub fn name(&self) -> &'static str {
        match self {
            AdFamily::Splash => "splash",
            AdFamily::Reward => "reward",
            AdFamily::FullScreen => "fullscreen",
            AdFamily::Banner => "banner",
            AdFamily::Feed => "feed",
        }
    }
}

/// Screen orientation for video ads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

impl Orientation {
    /// Parse from a host value: a name or the provider's numeric constant (1 = vertical, 2 = horizontal).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "vertical" | "portrait" | "1" => Some(Orientation::Vertical),
            "horizontal" | "landscape" | "2" => Some(Orientation::Horizontal),
            _ => None,
        }
    }
}
