//! Load / show lifecycle tests.
//!
//! Drives each presented ad family through the manager with a mock provider
//! and checks the normalized event stream.

use std::sync::Arc;
use std::time::Duration;

use adrelay_core::{
    codes, AdError, AdEventKind, AdManager, AdState, AdType, CloseInfo, CloseReason,
    ConfigurationError, EventStream, EventType, NativeAdRef, ProviderError, ProviderSet,
    RequestOptions, RewardInfo, ViewContainer,
};
use adrelay_testing::{
    collect_events, expect_no_events, init_test_tracing, sample_ecpm, MockAd, MockProvider,
    PresentBehavior, RecordingContainer,
};

const WAIT: Duration = Duration::from_secs(1);
const QUIET: Duration = Duration::from_millis(50);

fn setup() -> (AdManager, EventStream, Arc<MockProvider>) {
    init_test_tracing();
    let provider = MockProvider::new();
    let (manager, stream) = AdManager::new(ProviderSet::new().with_all(provider.clone()));
    (manager, stream, provider)
}

fn types(events: &[adrelay_core::AdEvent]) -> Vec<EventType> {
    events.iter().map(|e| e.event_type()).collect()
}

#[tokio::test]
async fn test_reward_not_ready_keeps_loaded() -> anyhow::Result<()> {
    let (manager, mut stream, provider) = setup();

    let id = manager.load(None, AdType::Reward, "pid1", &RequestOptions::default())?;
    provider.callbacks(&id).unwrap().loaded(NativeAdRef::reward(MockAd::new("r1")));
    let loaded = collect_events(&mut stream, 1, WAIT).await?;
    assert_eq!(loaded[0].event_type(), EventType::Loaded);

    provider.set_ready(false);
    manager.show(&id)?;

    let events = collect_events(&mut stream, 1, WAIT).await?;
    assert_eq!(events[0].event_type(), EventType::Failed);
    assert_eq!(events[0].error_code(), Some(codes::NOT_READY));
    assert_eq!(manager.snapshot(&id).unwrap().state, AdState::Loaded);
    assert!(provider.presented().is_empty());

    // ready again: the same handle can still be shown
    provider.set_ready(true);
    manager.show(&id)?;
    assert_eq!(provider.presented().len(), 1);
    assert_eq!(manager.snapshot(&id).unwrap().state, AdState::Showing);
    Ok(())
}

#[tokio::test]
async fn test_reward_full_flow() -> anyhow::Result<()> {
    let (manager, mut stream, provider) = setup();
    let options = RequestOptions::default().with_reward("coin", 10);

    let id = manager.load(Some("reward-1".to_string()), AdType::Reward, "pid1", &options)?;
    assert_eq!(id, "reward-1");
    assert_eq!(provider.last_request().unwrap().reward.unwrap().reward_amount, 10);

    let cb = provider.callbacks(&id).unwrap();
    cb.loaded(NativeAdRef::reward(MockAd::new("r1").with_ecpm(sample_ecpm("pangle", "12.5"))));
    manager.show(&id)?;
    cb.shown();
    cb.rewarded(RewardInfo::verified("coin", 10));
    cb.skipped();
    cb.video_completed();
    cb.closed(CloseInfo::new(CloseReason::Dismissed));

    let events = collect_events(&mut stream, 6, WAIT).await?;
    assert_eq!(
        types(&events),
        vec![
            EventType::Loaded,
            EventType::Shown,
            EventType::Rewarded,
            EventType::Skipped,
            EventType::Completed,
            EventType::Closed,
        ]
    );
    match &events[1].kind {
        AdEventKind::Shown { ecpm } => {
            assert_eq!(ecpm.as_ref().unwrap().sdk_name.as_deref(), Some("pangle"))
        }
        other => panic!("unexpected kind {other:?}"),
    }

    let record = serde_json::to_value(events[0].to_record())?;
    assert_eq!(record["adId"], "reward-1");
    assert_eq!(record["adType"], "rewardVideo");
    assert_eq!(record["data"]["ecpmInfo"]["ecpm"], "12.5");
    assert_eq!(manager.snapshot(&id).unwrap().state, AdState::Closed);
    Ok(())
}

#[tokio::test]
async fn test_show_before_loaded_is_not_ready() -> anyhow::Result<()> {
    let (manager, mut stream, provider) = setup();

    let id = manager.load(None, AdType::FullScreen, "pid", &RequestOptions::default())?;
    manager.show(&id)?;

    let events = collect_events(&mut stream, 1, WAIT).await?;
    assert_eq!(events[0].error_code(), Some(codes::NOT_READY));
    expect_no_events(&mut stream, QUIET).await?;
    assert_eq!(manager.snapshot(&id).unwrap().state, AdState::Loading);
    assert!(provider.presented().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_duplicate_cached_success_single_loaded() -> anyhow::Result<()> {
    let (manager, mut stream, provider) = setup();

    let id = manager.load(None, AdType::Interstitial, "pid", &RequestOptions::default())?;
    let cb = provider.callbacks(&id).unwrap();
    let native = NativeAdRef::full_screen(MockAd::new("i1"));
    cb.loaded(native);
    cb.cached(None);
    cb.cached(Some(NativeAdRef::full_screen(MockAd::new("i1-cached"))));

    let events = collect_events(&mut stream, 1, WAIT).await?;
    assert_eq!(events[0].event_type(), EventType::Loaded);
    expect_no_events(&mut stream, QUIET).await?;

    // the stored reference was replaced and the old one released
    assert_eq!(provider.destroyed(), 1);
    assert!(manager.stats().dropped >= 2);
    Ok(())
}

#[tokio::test]
async fn test_show_twice_is_already_shown() -> anyhow::Result<()> {
    let (manager, mut stream, provider) = setup();
    provider.set_present(PresentBehavior::AutoShow);

    let id = manager.load(None, AdType::FullScreen, "pid", &RequestOptions::default())?;
    provider.callbacks(&id).unwrap().loaded(NativeAdRef::full_screen(MockAd::new("f")));
    manager.show(&id)?;
    manager.show(&id)?;

    let events = collect_events(&mut stream, 3, WAIT).await?;
    assert_eq!(
        types(&events),
        vec![EventType::Loaded, EventType::Shown, EventType::Failed]
    );
    assert_eq!(events[2].error_code(), Some(codes::ALREADY_SHOWN));
    assert_eq!(provider.presented().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_present_failure_becomes_failed_event() -> anyhow::Result<()> {
    let (manager, mut stream, provider) = setup();
    provider.set_present(PresentBehavior::Fail(ProviderError::new("", "no activity")));

    let id = manager.load(None, AdType::FullScreen, "pid", &RequestOptions::default())?;
    provider.callbacks(&id).unwrap().loaded(NativeAdRef::full_screen(MockAd::new("f")));
    manager.show(&id)?;

    let events = collect_events(&mut stream, 2, WAIT).await?;
    assert_eq!(events[1].error_code(), Some(codes::SHOW_FAILED));
    assert_eq!(manager.snapshot(&id).unwrap().state, AdState::Failed);
    Ok(())
}

#[tokio::test]
async fn test_load_failure_is_terminal() -> anyhow::Result<()> {
    let (manager, mut stream, provider) = setup();

    let id = manager.load(None, AdType::Reward, "pid", &RequestOptions::default())?;
    let cb = provider.callbacks(&id).unwrap();
    cb.load_failed("40020", "no fill");
    cb.loaded(NativeAdRef::reward(MockAd::new("late")));
    manager.show(&id)?;

    let events = collect_events(&mut stream, 2, WAIT).await?;
    assert_eq!(events[0].error_code(), Some("40020"));
    match &events[0].kind {
        AdEventKind::Failed { message, .. } => assert_eq!(message, "no fill"),
        other => panic!("unexpected kind {other:?}"),
    }
    assert_eq!(events[1].error_code(), Some(codes::NOT_READY));
    expect_no_events(&mut stream, QUIET).await?;

    // still queryable until disposed
    assert_eq!(manager.snapshot(&id).unwrap().state, AdState::Failed);
    assert_eq!(provider.destroyed(), 1);
    Ok(())
}

#[tokio::test]
async fn test_splash_presents_into_host_and_unmounts_on_close() -> anyhow::Result<()> {
    let (manager, mut stream, provider) = setup();
    let host = Arc::new(RecordingContainer::new());

    let id = manager.load(None, AdType::Splash, "splash", &RequestOptions::default())?;
    manager.attach_view(&id, host.clone() as Arc<dyn ViewContainer>)?;
    let cb = provider.callbacks(&id).unwrap();
    cb.loaded(NativeAdRef::splash(MockAd::new("s")));
    manager.show(&id)?;
    cb.shown();
    cb.clicked();
    cb.closed(CloseInfo::new(CloseReason::from_provider("click_skip")));

    let events = collect_events(&mut stream, 4, WAIT).await?;
    assert_eq!(
        types(&events),
        vec![
            EventType::Loaded,
            EventType::Shown,
            EventType::Clicked,
            EventType::Closed
        ]
    );
    assert_eq!(
        events[3].kind,
        AdEventKind::Closed(CloseInfo::new(CloseReason::UserSkip))
    );
    assert_eq!(provider.presented(), vec![(id.clone(), true)]);
    assert!(host.clear_calls() >= 1);
    assert_eq!(provider.last_request().unwrap().timeout, Some(Duration::from_millis(3500)));
    Ok(())
}

#[tokio::test]
async fn test_clicks_before_shown_are_dropped() -> anyhow::Result<()> {
    let (manager, mut stream, provider) = setup();

    let id = manager.load(None, AdType::Reward, "pid", &RequestOptions::default())?;
    let cb = provider.callbacks(&id).unwrap();
    cb.loaded(NativeAdRef::reward(MockAd::new("r")));
    cb.clicked();
    cb.closed(CloseInfo::default());
    cb.rewarded(RewardInfo::default());

    let events = collect_events(&mut stream, 1, WAIT).await?;
    assert_eq!(events[0].event_type(), EventType::Loaded);
    expect_no_events(&mut stream, QUIET).await?;
    Ok(())
}

#[tokio::test]
async fn test_reward_events_before_impression_follow_shown() -> anyhow::Result<()> {
    let (manager, mut stream, provider) = setup();

    let id = manager.load(None, AdType::Reward, "pid", &RequestOptions::default())?;
    let cb = provider.callbacks(&id).unwrap();
    cb.loaded(NativeAdRef::reward(MockAd::new("r")));
    manager.show(&id)?;
    cb.rewarded(RewardInfo::verified("coin", 10));
    cb.video_completed();
    cb.skipped();
    cb.shown();
    cb.closed(CloseInfo::default());

    let events = collect_events(&mut stream, 6, WAIT).await?;
    assert_eq!(
        types(&events),
        vec![
            EventType::Loaded,
            EventType::Shown,
            EventType::Rewarded,
            EventType::Completed,
            EventType::Skipped,
            EventType::Closed,
        ]
    );
    let seqs: Vec<u64> = events.iter().map(|e| e.sequence).collect();
    assert_eq!(seqs, vec![1, 2, 3, 4, 5, 6]);
    expect_no_events(&mut stream, QUIET).await?;
    Ok(())
}

#[tokio::test]
async fn test_preflight_validation() {
    let (manager, _stream, _provider) = setup();

    let err = manager
        .load(None, AdType::Banner, "  ", &RequestOptions::default())
        .unwrap_err();
    assert_eq!(err, AdError::Configuration(ConfigurationError::EmptyPlacement));

    let err = manager
        .load_raw(None, "video", "pid", &serde_json::json!({}))
        .unwrap_err();
    assert!(matches!(
        err,
        AdError::Configuration(ConfigurationError::UnknownAdType(_))
    ));

    manager
        .load(Some("dup".to_string()), AdType::Banner, "pid", &RequestOptions::default())
        .unwrap();
    let err = manager
        .load(Some("dup".to_string()), AdType::Banner, "pid", &RequestOptions::default())
        .unwrap_err();
    assert_eq!(
        err,
        AdError::Configuration(ConfigurationError::DuplicateAdId("dup".to_string()))
    );

    assert_eq!(
        manager.show("").unwrap_err(),
        AdError::Configuration(ConfigurationError::EmptyAdId)
    );
}

#[tokio::test]
async fn test_missing_provider_is_rejected() {
    let provider = MockProvider::new();
    let providers = ProviderSet::new().with(adrelay_core::AdFamily::Reward, provider.clone());
    let (manager, _stream) = AdManager::new(providers);

    let err = manager
        .load(None, AdType::Feed, "pid", &RequestOptions::default())
        .unwrap_err();
    assert_eq!(
        err,
        AdError::Configuration(ConfigurationError::NoProvider(AdType::Feed))
    );
    assert!(provider.requests().is_empty());
    assert_eq!(manager.live_count(), 0);
}

#[tokio::test]
async fn test_load_raw_reads_nested_options() -> anyhow::Result<()> {
    let (manager, _stream, provider) = setup();

    manager.load_raw(
        None,
        "draw_native",
        "feed-pid",
        &serde_json::json!({ "androidOptions": { "width": "640", "adCount": 2 } }),
    )?;

    let request = provider.last_request().unwrap();
    assert_eq!(request.ad_type, AdType::Feed);
    assert_eq!(request.size.unwrap().width, 640);
    assert_eq!(request.size.unwrap().height, 720);
    assert_eq!(request.ad_count, 2);
    Ok(())
}

#[tokio::test]
async fn test_unknown_id_is_silent() -> anyhow::Result<()> {
    let (manager, mut stream, _provider) = setup();

    manager.show("missing")?;
    manager.attach_view("missing", Arc::new(RecordingContainer::new()))?;
    manager.detach_view("missing");
    assert!(!manager.dispose_ad("missing"));

    expect_no_events(&mut stream, QUIET).await?;
    Ok(())
}
