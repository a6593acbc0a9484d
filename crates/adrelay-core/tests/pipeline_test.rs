//! Event ordering and delivery tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use parking_lot::Mutex;

use adrelay_core::{
    AdEvent, AdManager, AdType, CloseInfo, EventType, NativeAdRef, ProviderSet, RequestOptions,
    RewardInfo,
};
use adrelay_testing::{collect_events, MockAd, MockProvider};

const WAIT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn test_per_id_order_across_callback_threads() -> anyhow::Result<()> {
    let provider = MockProvider::new();
    let (manager, mut stream) = AdManager::new(ProviderSet::new().with_all(provider.clone()));

    let mut ids = Vec::new();
    for _ in 0..16 {
        ids.push(manager.load(None, AdType::Reward, "pid", &RequestOptions::default())?);
    }

    let threads: Vec<_> = ids
        .iter()
        .map(|id| {
            let cb = provider.callbacks(id).unwrap();
            let manager = manager.clone();
            let id = id.clone();
            std::thread::spawn(move || {
                cb.loaded(NativeAdRef::reward(MockAd::new("r")));
                manager.show(&id).unwrap();
                cb.shown();
                cb.rewarded(RewardInfo::verified("coin", 1));
                cb.video_completed();
                cb.closed(CloseInfo::default());
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    let events = collect_events(&mut stream, 16 * 5, WAIT).await?;
    let mut per_id: HashMap<String, Vec<&AdEvent>> = HashMap::new();
    for event in &events {
        per_id.entry(event.ad_id.clone()).or_default().push(event);
    }
    assert_eq!(per_id.len(), 16);
    for seq in per_id.values() {
        let types: Vec<EventType> = seq.iter().map(|e| e.event_type()).collect();
        assert_eq!(
            types,
            vec![
                EventType::Loaded,
                EventType::Shown,
                EventType::Rewarded,
                EventType::Completed,
                EventType::Closed,
            ]
        );
        let numbers: Vec<u64> = seq.iter().map(|e| e.sequence).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }
    assert_eq!(manager.stats().emitted, 80);
    Ok(())
}

#[tokio::test]
async fn test_spawned_delivery_context() {
    let provider = MockProvider::new();
    let (manager, stream) = AdManager::new(ProviderSet::new().with_all(provider.clone()));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let delivery = stream.spawn_delivery(move |event: AdEvent| {
        sink.lock().push((event.ad_id.clone(), event.event_type()));
    });

    let id = manager
        .load(None, AdType::Splash, "pid", &RequestOptions::default())
        .unwrap();
    let cb = provider.callbacks(&id).unwrap();
    cb.loaded(NativeAdRef::splash(MockAd::new("s")));
    manager.show(&id).unwrap();
    cb.shown();

    // the stream ends once the manager and every callback object are gone
    drop(cb);
    drop(manager);
    drop(provider);
    let delivered = tokio::time::timeout(WAIT, delivery.join()).await.unwrap();

    assert_eq!(delivered, 2);
    assert_eq!(
        *seen.lock(),
        vec![(id.clone(), EventType::Loaded), (id, EventType::Shown)]
    );
}

#[tokio::test]
async fn test_stream_interface() {
    let provider = MockProvider::new();
    let (manager, stream) = AdManager::new(ProviderSet::new().with_all(provider.clone()));

    let id = manager
        .load(None, AdType::Interstitial, "pid", &RequestOptions::default())
        .unwrap();
    provider.callbacks(&id).unwrap().load_failed("", "timeout");

    let mut stream = stream;
    let event = tokio::time::timeout(WAIT, stream.next()).await.unwrap().unwrap();
    let record = event.to_record();
    assert_eq!(record.event_type, EventType::Failed);
    assert_eq!(record.error_code.as_deref(), Some("load_failed"));
    assert_eq!(record.error_message.as_deref(), Some("timeout"));
    assert_eq!(record.ad_type, AdType::Interstitial);
}
