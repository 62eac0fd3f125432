//! Testing utilities for the companion.
//!
//! This module provides tools for deterministic tests:
//! - `ManualClock` for driving elapsed time by hand
//! - `RecordingObserver` for capturing every callback in order
//! - `TestHarness` for scripted wait scenarios
//! - Assertion helpers for verifying what was shown

use crate::clock::Clock;
use crate::companion::Companion;
use crate::config::CompanionConfig;
use crate::content::{ContentRepository, Feature, Verification};
use crate::events::{CompanionEvent, CompanionObserver, Interaction, ObserverError};
use crate::phase::{duration_ms, PhaseKind};
use crate::session::SessionSummary;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let by = duration_ms(by);
        // Saturates instead of wrapping.
        let _ = self
            .now_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |ms| {
                Some(ms.saturating_add(by))
            });
    }

    /// Jump to an absolute reading. Moving backwards is allowed, which is
    /// useful for checking that phases never regress.
    pub fn set(&self, now: Duration) {
        self.now_ms.store(duration_ms(now), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.now_ms.load(Ordering::SeqCst))
    }
}

/// Observer that records every callback. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<CompanionEvent>>>,
    fail: bool,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// An observer that records events but reports every callback as failed.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn record(&self, event: CompanionEvent) -> Result<(), ObserverError> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
        if self.fail {
            Err("renderer unavailable".into())
        } else {
            Ok(())
        }
    }

    /// Everything recorded so far, in order.
    pub fn events(&self) -> Vec<CompanionEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    pub fn interactions(&self) -> Vec<Interaction> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                CompanionEvent::Interaction(i) => Some(i),
                _ => None,
            })
            .collect()
    }

    /// Interactions of one phase kind.
    pub fn interactions_of(&self, kind: PhaseKind) -> Vec<Interaction> {
        self.interactions()
            .into_iter()
            .filter(|i| i.kind == kind)
            .collect()
    }

    /// Logical pose names, in order.
    pub fn poses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                CompanionEvent::PoseChanged { pose, .. } => Some(pose),
                _ => None,
            })
            .collect()
    }

    /// Composite pose ids, in order.
    pub fn pose_ids(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                CompanionEvent::PoseChanged { pose_id, .. } => Some(pose_id),
                _ => None,
            })
            .collect()
    }

    pub fn verifications(&self) -> Vec<Verification> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                CompanionEvent::VerificationRequested(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn features(&self) -> Vec<Feature> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                CompanionEvent::FeatureDiscovered(f) => Some(f),
                _ => None,
            })
            .collect()
    }
}

impl CompanionObserver for RecordingObserver {
    fn on_interaction(&self, interaction: &Interaction) -> Result<(), ObserverError> {
        self.record(CompanionEvent::Interaction(interaction.clone()))
    }

    fn on_pose_change(&self, pose_id: &str, pose: &str) -> Result<(), ObserverError> {
        self.record(CompanionEvent::PoseChanged {
            pose_id: pose_id.to_string(),
            pose: pose.to_string(),
        })
    }

    fn on_verification_request(&self, verification: &Verification) -> Result<(), ObserverError> {
        self.record(CompanionEvent::VerificationRequested(verification.clone()))
    }

    fn on_feature_discovery(&self, feature: &Feature) -> Result<(), ObserverError> {
        self.record(CompanionEvent::FeatureDiscovered(feature.clone()))
    }
}

/// Test harness for running wait scenarios on a manual clock.
pub struct TestHarness {
    /// The companion under test.
    pub companion: Companion,
    /// Records everything the companion emits.
    pub observer: RecordingObserver,
    /// Drives elapsed time.
    pub clock: ManualClock,
}

impl TestHarness {
    /// Default configuration and content with a fixed seed.
    pub fn new() -> Self {
        Self::with_config(CompanionConfig::new(), 0)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_config(CompanionConfig::new(), seed)
    }

    pub fn with_config(config: CompanionConfig, seed: u64) -> Self {
        let observer = RecordingObserver::new();
        let clock = ManualClock::new();
        let companion = Companion::new(config, observer.clone())
            .with_rng(StdRng::seed_from_u64(seed))
            .with_clock(clock.clone());
        Self {
            companion,
            observer,
            clock,
        }
    }

    /// Swap in a different content repository.
    pub fn with_content(mut self, content: ContentRepository) -> Self {
        self.companion = self.companion.with_content(content);
        self
    }

    pub fn start(&mut self, process_name: &str) -> &mut Self {
        self.companion.start(process_name, None);
        self
    }

    /// Advance the clock and run one tick.
    pub fn tick_after(&mut self, by: Duration) -> Option<PhaseKind> {
        self.clock.advance(by);
        self.companion.tick()
    }

    /// Move the clock to `elapsed_ms` past the start of the test and tick.
    pub fn tick_at(&mut self, elapsed_ms: u64) -> Option<PhaseKind> {
        self.clock.set(Duration::from_millis(elapsed_ms));
        self.companion.tick()
    }

    /// Tick every `step` until `until_ms`, returning the phases entered.
    pub fn run_until(&mut self, until_ms: u64, step: Duration) -> Vec<PhaseKind> {
        let mut entered = Vec::new();
        let step_ms = duration_ms(step).max(1);
        let mut now = duration_ms(self.clock.now());
        while now < until_ms {
            now = now.saturating_add(step_ms).min(until_ms);
            if let Some(kind) = self.tick_at(now) {
                entered.push(kind);
            }
        }
        entered
    }

    pub fn stop(&mut self) -> SessionSummary {
        self.companion.stop()
    }

    pub fn current_phase(&self) -> Option<PhaseKind> {
        self.companion.current_phase()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the companion is in the given phase.
#[track_caller]
pub fn assert_phase(harness: &TestHarness, expected: Option<PhaseKind>) {
    let actual = harness.current_phase();
    assert_eq!(
        actual, expected,
        "Expected phase {expected:?}, got {actual:?}"
    );
}

/// Assert no deduplicated interaction was shown twice.
#[track_caller]
pub fn assert_no_repeats(harness: &TestHarness) {
    let mut seen = HashSet::new();
    for interaction in harness.observer.interactions() {
        if interaction.kind == PhaseKind::Micro {
            continue;
        }
        let key = (
            interaction.kind,
            interaction.message.clone(),
            interaction.field.clone(),
            interaction.feature.clone(),
        );
        assert!(
            seen.insert(key),
            "Interaction shown twice: {interaction:?}"
        );
    }
}

/// Assert exactly `count` interactions of `kind` were shown.
#[track_caller]
pub fn assert_shown(harness: &TestHarness, kind: PhaseKind, count: usize) {
    let actual = harness.observer.interactions_of(kind).len();
    assert_eq!(
        actual, count,
        "Expected {count} {kind} interactions, got {actual}"
    );
}
