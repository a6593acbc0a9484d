//! Event collection helpers.

use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::time::timeout;

use adrelay_core::{AdEvent, EcpmInfo, EventStream};

/// Receive exactly `count` events, failing if they do not arrive in time.
pub async fn collect_events(
    stream: &mut EventStream,
    count: usize,
    wait: Duration,
) -> Result<Vec<AdEvent>> {
    let mut events = Vec::with_capacity(count);
    while events.len() < count {
        match timeout(wait, stream.recv()).await {
            Ok(Some(event)) => events.push(event),
            Ok(None) => return Err(anyhow!("event stream closed after {} events", events.len())),
            Err(_) => {
                return Err(anyhow!(
                    "timed out waiting for event {} of {}",
                    events.len() + 1,
                    count
                ))
            }
        }
    }
    Ok(events)
}

/// Fail if any event arrives within `wait`.
pub async fn expect_no_events(stream: &mut EventStream, wait: Duration) -> Result<()> {
    match timeout(wait, stream.recv()).await {
        Ok(Some(event)) => Err(anyhow!(
            "unexpected {} event for {}",
            event.event_type(),
            event.ad_id
        )),
        Ok(None) | Err(_) => Ok(()),
    }
}

/// Install a test subscriber once; later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("adrelay_core=debug")
        .with_test_writer()
        .try_init();
}

/// Ecpm record with the commonly asserted fields set.
pub fn sample_ecpm(sdk: &str, price: &str) -> EcpmInfo {
    EcpmInfo {
        sdk_name: Some(sdk.to_string()),
        ecpm: Some(price.to_string()),
        slot_id: Some(format!("{sdk}-slot")),
        request_id: Some("req-1".to_string()),
        ..Default::default()
    }
}
