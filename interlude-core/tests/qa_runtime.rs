//! QA tests for the tokio driver, on a paused clock.
//!
//! Run with: `cargo test -p interlude-core --test qa_runtime`

use interlude_core::testing::RecordingObserver;
use interlude_core::{
    ChannelObserver, Companion, CompanionConfig, CompanionEvent, CompanionHandle, PhaseKind,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tokio::time;

fn recording_handle(config: CompanionConfig) -> (CompanionHandle, RecordingObserver) {
    let observer = RecordingObserver::new();
    let companion = Companion::new(config, observer.clone()).with_rng(StdRng::seed_from_u64(21));
    (CompanionHandle::new(companion), observer)
}

// =============================================================================
// Scenario A: initial pose, then engagement at 500ms
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_start_pose_then_engagement() {
    let (handle, observer) = recording_handle(CompanionConfig::new());

    handle.start("loading", None).await;
    assert_eq!(observer.poses(), vec!["thinking".to_string()]);
    assert_eq!(observer.pose_ids(), vec!["kyur-thinking".to_string()]);

    time::sleep(Duration::from_millis(499)).await;
    assert!(observer.interactions().is_empty());

    time::sleep(Duration::from_millis(2)).await;
    let interactions = observer.interactions();
    assert_eq!(interactions.len(), 1);
    assert_eq!(interactions[0].kind, PhaseKind::Micro);
    assert!(interactions[0].message.is_none());

    let kyur_poses = handle
        .with_companion(|c| c.content().micro_poses("kyur").to_vec())
        .await;
    assert!(kyur_poses.contains(&interactions[0].pose));

    handle.stop().await;
}

// =============================================================================
// Scenario C: stop before the first periodic tick
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_stop_before_first_tick() {
    let config = CompanionConfig::new()
        .with_tick_interval(Duration::from_secs(5))
        .unwrap();
    let (handle, observer) = recording_handle(config);

    handle.start("loading", None).await;
    time::sleep(Duration::from_millis(2_000)).await;
    let summary = handle.stop().await;

    assert_eq!(summary.phase, None);
    assert_eq!(summary.interactions_shown_count, 0);
    assert_eq!(summary.duration_ms, 2_000);
    assert_eq!(summary.process_name, "loading");
    // The engagement at 500ms did run; it is a pose-only draw and not counted.
    assert_eq!(observer.interactions_of(PhaseKind::Micro).len(), 1);
    assert_eq!(observer.poses().last().map(String::as_str), Some("excited"));

    // Nothing more after stop, and stopping again is harmless.
    let events = observer.events().len();
    time::sleep(Duration::from_secs(30)).await;
    assert_eq!(observer.events().len(), events);
    assert_eq!(handle.stop().await, summary);
}

// =============================================================================
// Full wait on the default cadence
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_full_wait_over_channel() {
    let (observer, mut events) = ChannelObserver::channel();
    let companion = Companion::new(CompanionConfig::new(), observer)
        .with_rng(StdRng::seed_from_u64(8));
    let handle = CompanionHandle::new(companion);

    handle.start("avatar", Some(Duration::from_secs(60))).await;
    time::sleep(Duration::from_millis(75_500)).await;

    assert_eq!(handle.current_phase().await, Some(PhaseKind::Discover));
    assert_eq!(handle.progress().await, Some(1.0));
    let summary = handle.stop().await;
    assert_eq!(summary.interactions_shown_count, 4);

    let mut kinds = Vec::new();
    let mut verification_requests = 0;
    let mut feature_discoveries = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            CompanionEvent::Interaction(i) => kinds.push(i.kind),
            CompanionEvent::VerificationRequested(_) => verification_requests += 1,
            CompanionEvent::FeatureDiscovered(_) => feature_discoveries += 1,
            CompanionEvent::PoseChanged { .. } => {}
        }
    }

    // Engagement micro, then one entry per phase in order.
    assert_eq!(
        kinds,
        vec![
            PhaseKind::Micro,
            PhaseKind::Micro,
            PhaseKind::Tip,
            PhaseKind::Fact,
            PhaseKind::Verify,
            PhaseKind::Discover,
        ]
    );
    assert_eq!(verification_requests, 1);
    assert_eq!(feature_discoveries, 1);
}

#[tokio::test(start_paused = true)]
async fn test_set_character_through_handle() {
    let (handle, observer) = recording_handle(CompanionConfig::new());
    handle.start("avatar", None).await;
    time::sleep(Duration::from_millis(600)).await;

    handle.set_character("default").await;
    assert!(observer.pose_ids().last().unwrap().starts_with("default-"));
    assert_eq!(handle.current_phase().await, None);

    handle.stop().await;
    assert!(!handle.is_active().await);
    assert!(handle.elapsed().await >= Duration::from_millis(600));
}
