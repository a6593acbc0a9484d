//! Mediation metadata extraction.
//!
//! Each family reaches its mediation manager through a different path on the
//! native reference. The per-family readers are registered in the controller
//! behavior table; [`extract`] is the single entry point used by emission.

use serde::{Deserialize, Serialize};

use crate::handle::AdHandle;
use crate::native::NativeAdRef;

/// Flat mediation record describing the ad that won.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EcpmInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdk_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_sdk_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<String>,
    /// Price, as reported by the network
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecpm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub req_bidding_type: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creative_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rit_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_rit_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ab_test_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<String>,
}

impl EcpmInfo {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == EcpmInfo::default()
    }
}

/// Reader for one family's native reference.
pub(crate) type EcpmReader = fn(&NativeAdRef) -> Option<EcpmInfo>;

/// Metadata for the native reference the handle currently holds.
///
/// `None` before a native reference exists, when the reference belongs to
/// another family, or when the network reports nothing.
pub fn extract(handle: &AdHandle) -> Option<EcpmInfo> {
    let native = handle.native()?;
    let behavior = crate::controller::behavior(handle.ad_type().family());
    (behavior.extract_ecpm)(native).filter(|info| !info.is_empty())
}

pub(crate) fn splash(native: &NativeAdRef) -> Option<EcpmInfo> {
    match native {
        NativeAdRef::Splash(ad) => ad.mediation()?.show_ecpm(),
        _ => None,
    }
}

pub(crate) fn reward(native: &NativeAdRef) -> Option<EcpmInfo> {
    match native {
        NativeAdRef::Reward(ad) => ad.mediation()?.show_ecpm(),
        _ => None,
    }
}

pub(crate) fn full_screen(native: &NativeAdRef) -> Option<EcpmInfo> {
    match native {
        NativeAdRef::FullScreen(ad) => ad.mediation()?.show_ecpm(),
        _ => None,
    }
}

pub(crate) fn banner(native: &NativeAdRef) -> Option<EcpmInfo> {
    match native {
        NativeAdRef::Banner(ad) => ad.mediation()?.show_ecpm(),
        _ => None,
    }
}

/// Feed lists keep only their first ad, so only that one is read.
pub(crate) fn feed(native: &NativeAdRef) -> Option<EcpmInfo> {
    match native {
        NativeAdRef::Feed(ad) => ad.mediation()?.show_ecpm(),
        _ => None,
    }
}
