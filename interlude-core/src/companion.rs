//! The wait companion.
//!
//! [`Companion`] owns one session at a time and turns elapsed wait time into
//! pose and interaction callbacks. It is synchronous: something else has to
//! call [`Companion::tick`] periodically and [`Companion::engage`] once
//! shortly after `start`. [`CompanionHandle`](crate::CompanionHandle) does
//! that on tokio.

use crate::clock::{Clock, SystemClock};
use crate::config::CompanionConfig;
use crate::content::{Category, ContentList, ContentOverride, ContentRepository};
use crate::events::{CompanionObserver, Interaction, ObserverError};
use crate::phase::{duration_ms, PhaseKind};
use crate::pose::PoseEmitter;
use crate::scheduler::PhaseScheduler;
use crate::selection::{pick_random, pick_unused, UsedKeys};
use crate::session::{Session, SessionId, SessionSummary};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct Companion {
    config: CompanionConfig,
    character: String,
    content: ContentRepository,
    scheduler: PhaseScheduler,
    session: Option<Session>,
    poses: PoseEmitter,
    observer: Box<dyn CompanionObserver>,
    rng: Box<dyn RngCore + Send>,
    clock: Box<dyn Clock>,
}

impl Companion {
    /// Create a companion with built-in content, an entropy-seeded RNG and
    /// the system clock.
    pub fn new(config: CompanionConfig, observer: impl CompanionObserver + 'static) -> Self {
        Self {
            character: config.character.clone(),
            scheduler: PhaseScheduler::new(config.phases.clone()),
            config,
            content: ContentRepository::default(),
            session: None,
            poses: PoseEmitter,
            observer: Box::new(observer),
            rng: Box::new(StdRng::from_entropy()),
            clock: Box::new(SystemClock::new()),
        }
    }

    /// Use a specific random source, e.g. a seeded one in tests.
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the whole content repository.
    pub fn with_content(mut self, content: ContentRepository) -> Self {
        self.content = content;
        self
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Begin a new session, discarding all state from any previous one.
    pub fn start(
        &mut self,
        process_name: impl Into<String>,
        estimated_duration: Option<Duration>,
    ) -> &mut Self {
        let session = Session::new(process_name, estimated_duration, self.clock.now());
        info!(
            session = %session.id,
            process = %session.process_name,
            character = %self.character,
            "wait session started"
        );
        self.session = Some(session);
        self.scheduler.reset();

        let pose = self.config.start_pose.clone();
        self.show_pose(&pose);
        self
    }

    /// End the session and report on it.
    ///
    /// Calling `stop` again returns the same summary without emitting
    /// anything.
    pub fn stop(&mut self) -> SessionSummary {
        let now = self.clock.now();
        let phase = self.scheduler.current();
        let Some(session) = self.session.as_mut() else {
            return SessionSummary::never_started();
        };

        let was_active = session.active;
        if was_active {
            session.active = false;
            session.stopped_at = Some(now);
        }
        let summary = session.summary(session.stopped_at.unwrap_or(now), phase);

        if was_active {
            info!(
                session = %session.id,
                duration_ms = summary.duration_ms,
                shown = summary.interactions_shown_count,
                phase = ?summary.phase,
                "wait session stopped"
            );
            let pose = self.config.stop_pose.clone();
            self.show_pose(&pose);
        }
        summary
    }

    /// Re-evaluate elapsed time and run the entry action of a newly entered
    /// phase. Returns that phase.
    pub fn tick(&mut self) -> Option<PhaseKind> {
        if !self.is_active() {
            return None;
        }
        let entered = self.scheduler.advance(self.elapsed())?;
        debug!(phase = %entered, elapsed_ms = duration_ms(self.elapsed()), "phase entered");
        self.enter_phase(entered);
        Some(entered)
    }

    /// The early ambient pose fired shortly after `start`.
    ///
    /// No-op unless a session is active.
    pub fn engage(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.ambient();
        true
    }

    /// [`tick`](Self::tick) for a specific session. Returns false once that
    /// session is no longer the active one.
    pub fn tick_session(&mut self, id: SessionId) -> bool {
        if !self.is_session_active(id) {
            return false;
        }
        self.tick();
        true
    }

    /// [`engage`](Self::engage) for a specific session.
    pub fn engage_session(&mut self, id: SessionId) -> bool {
        self.is_session_active(id) && self.engage()
    }

    // ========================================================================
    // Configuration changes
    // ========================================================================

    /// Switch persona. An active session immediately shows an ambient pose
    /// for the new character; phase and used content are untouched.
    pub fn set_character(&mut self, character: impl Into<String>) {
        self.character = character.into();
        debug!(character = %self.character, "character changed");
        if self.is_active() {
            self.ambient();
        }
    }

    /// Replace whole content categories.
    pub fn load_content(&mut self, partial: ContentOverride) {
        debug!(categories = ?partial.categories(), "content override loaded");
        self.content.apply_override(partial);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn is_active(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.active)
    }

    fn is_session_active(&self, id: SessionId) -> bool {
        self.session.as_ref().is_some_and(|s| s.active && s.id == id)
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    /// Time since the last `start`, or zero if never started.
    pub fn elapsed(&self) -> Duration {
        self.session
            .as_ref()
            .map_or(Duration::ZERO, |s| s.elapsed(self.clock.now()))
    }

    /// Estimated completion of the current session, if an estimate was given.
    pub fn progress(&self) -> Option<f32> {
        self.session.as_ref()?.progress(self.clock.now())
    }

    pub fn current_phase(&self) -> Option<PhaseKind> {
        self.scheduler.current()
    }

    pub fn character(&self) -> &str {
        &self.character
    }

    pub fn content(&self) -> &ContentRepository {
        &self.content
    }

    pub fn config(&self) -> &CompanionConfig {
        &self.config
    }

    /// Content shown in the current session.
    pub fn used_keys(&self) -> Option<&UsedKeys> {
        self.session.as_ref().map(|s| &s.used)
    }

    // ========================================================================
    // Phase actions
    // ========================================================================

    fn enter_phase(&mut self, kind: PhaseKind) {
        if kind == PhaseKind::Micro {
            return self.ambient();
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let tag = kind.as_str();
        let rng = &mut *self.rng;

        match self.content.resolve(Category::for_phase(kind), &self.character) {
            ContentList::Text(list) => {
                let Some(pick) = pick_unused(list, tag, &mut session.used, rng) else {
                    return exhausted(kind);
                };
                let interaction = Interaction::message(kind, pick.item.clone());
                self.present(&interaction);
            }
            ContentList::Verifications(list) => {
                let Some(pick) = pick_unused(list, tag, &mut session.used, rng) else {
                    return exhausted(kind);
                };
                let verification = pick.item.clone();
                self.present(&Interaction::verification(&verification));
                contain(
                    "on_verification_request",
                    self.observer.on_verification_request(&verification),
                );
            }
            ContentList::Features(list) => {
                let Some(pick) = pick_unused(list, tag, &mut session.used, rng) else {
                    return exhausted(kind);
                };
                let feature = pick.item.clone();
                self.present(&Interaction::discovery(&feature));
                contain(
                    "on_feature_discovery",
                    self.observer.on_feature_discovery(&feature),
                );
            }
        }
    }

    /// Show a random micro pose for the current character.
    fn ambient(&mut self) {
        let ContentList::Text(poses) = self.content.resolve(Category::MicroPoses, &self.character)
        else {
            return;
        };
        let Some(pick) = pick_random(poses, &mut *self.rng) else {
            debug!(character = %self.character, "no micro poses for character");
            return;
        };
        let interaction = Interaction::micro(pick.item.clone());
        self.present(&interaction);
    }

    /// Emit the interaction's pose, then the interaction itself.
    fn present(&self, interaction: &Interaction) {
        self.show_pose(&interaction.pose);
        contain("on_interaction", self.observer.on_interaction(interaction));
    }

    fn show_pose(&self, pose: &str) {
        contain(
            "on_pose_change",
            self.poses.emit(&*self.observer, &self.character, pose),
        );
    }
}

impl std::fmt::Debug for Companion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Companion")
            .field("character", &self.character)
            .field("session", &self.session)
            .field("phase", &self.scheduler.current())
            .finish_non_exhaustive()
    }
}

/// Log a failed observer callback instead of propagating it.
fn contain(callback: &'static str, result: Result<(), ObserverError>) {
    if let Err(e) = result {
        warn!(callback, error = %e, "observer callback failed");
    }
}

fn exhausted(kind: PhaseKind) {
    debug!(phase = %kind, "content exhausted; no interaction shown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{CharacterContent, Verification};
    use crate::events::CompanionEvent;
    use crate::testing::{ManualClock, RecordingObserver};

    fn companion() -> (Companion, RecordingObserver, ManualClock) {
        let observer = RecordingObserver::new();
        let clock = ManualClock::new();
        let companion = Companion::new(CompanionConfig::new(), observer.clone())
            .with_rng(StdRng::seed_from_u64(9))
            .with_clock(clock.clone());
        (companion, observer, clock)
    }

    #[test]
    fn test_start_emits_thinking_pose() {
        let (mut companion, observer, _) = companion();
        companion.start("avatar", None);
        assert_eq!(
            observer.events(),
            vec![CompanionEvent::PoseChanged {
                pose_id: "kyur-thinking".to_string(),
                pose: "thinking".to_string(),
            }]
        );
        assert!(companion.is_active());
        assert_eq!(companion.current_phase(), None);
    }

    #[test]
    fn test_micro_draw_comes_from_character_list() {
        let (mut companion, observer, _) = companion();
        companion.start("avatar", None);
        assert!(companion.engage());

        let interactions = observer.interactions();
        assert_eq!(interactions.len(), 1);
        assert_eq!(interactions[0].kind, PhaseKind::Micro);
        assert!(companion.content().micro_poses("kyur").contains(&interactions[0].pose));
        assert!(companion.used_keys().unwrap().is_empty());
    }

    #[test]
    fn test_pose_precedes_interaction() {
        let (mut companion, observer, clock) = companion();
        companion.start("avatar", None);
        observer.clear();

        clock.advance(Duration::from_secs(6));
        assert_eq!(companion.tick(), Some(PhaseKind::Tip));

        let events = observer.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            CompanionEvent::PoseChanged { pose, .. } if pose == "pointing"
        ));
        assert!(matches!(&events[1], CompanionEvent::Interaction(i) if i.kind == PhaseKind::Tip));
    }

    #[test]
    fn test_verify_fires_request_after_interaction() {
        let (mut companion, observer, clock) = companion();
        companion.start("avatar", None);
        observer.clear();

        clock.advance(Duration::from_secs(31));
        assert_eq!(companion.tick(), Some(PhaseKind::Verify));

        let events = observer.events();
        assert_eq!(events.len(), 3);
        let CompanionEvent::Interaction(interaction) = &events[1] else {
            panic!("expected interaction, got {:?}", events[1]);
        };
        let CompanionEvent::VerificationRequested(verification) = &events[2] else {
            panic!("expected verification, got {:?}", events[2]);
        };
        assert_eq!(interaction.field.as_deref(), Some(verification.field.as_str()));
        assert_eq!(companion.used_keys().unwrap().count_tag("verify"), 1);
    }

    #[test]
    fn test_exhausted_category_still_advances() {
        let (companion, observer, clock) = companion();
        let mut companion = companion.with_content(ContentRepository::empty());
        companion.start("avatar", None);
        observer.clear();

        clock.advance(Duration::from_secs(6));
        assert_eq!(companion.tick(), Some(PhaseKind::Tip));
        assert!(observer.events().is_empty());
        assert_eq!(companion.current_phase(), Some(PhaseKind::Tip));
    }

    #[test]
    fn test_stop_summary_and_idempotence() {
        let (mut companion, observer, clock) = companion();
        companion.start("avatar", Some(Duration::from_secs(20)));
        clock.advance(Duration::from_secs(16));
        companion.tick();
        clock.advance(Duration::from_secs(1));

        let summary = companion.stop();
        assert_eq!(summary.duration_ms, 17_000);
        assert_eq!(summary.phase, Some(PhaseKind::Fact));
        assert_eq!(summary.interactions_shown_count, 1);
        assert_eq!(observer.poses().last().map(String::as_str), Some("excited"));

        let events_after_first_stop = observer.events().len();
        clock.advance(Duration::from_secs(5));
        assert_eq!(companion.stop(), summary);
        assert_eq!(observer.events().len(), events_after_first_stop);
        assert!(!companion.engage());
        assert_eq!(companion.tick(), None);
    }

    #[test]
    fn test_stop_before_start() {
        let (mut companion, observer, _) = companion();
        assert_eq!(companion.stop(), SessionSummary::never_started());
        assert!(observer.events().is_empty());
        assert_eq!(companion.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_restart_resets_state() {
        let (mut companion, _, clock) = companion();
        companion.start("first", None);
        clock.advance(Duration::from_secs(40));
        companion.tick();
        assert_eq!(companion.used_keys().unwrap().len(), 1);

        let first = companion.session_id();
        companion.start("second", None);
        assert_ne!(companion.session_id(), first);
        assert!(companion.used_keys().unwrap().is_empty());
        assert_eq!(companion.current_phase(), None);
        assert_eq!(companion.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_set_character_draws_ambient_only_when_active() {
        let (mut companion, observer, _) = companion();
        companion.set_character("default");
        assert!(observer.events().is_empty());

        companion.start("avatar", None);
        observer.clear();
        companion.set_character("kyur");
        let interactions = observer.interactions();
        assert_eq!(interactions.len(), 1);
        assert_eq!(interactions[0].kind, PhaseKind::Micro);
        assert!(observer.pose_ids()[0].starts_with("kyur-"));
    }

    #[test]
    fn test_load_content_is_used_for_next_draw() {
        let (mut companion, observer, clock) = companion();
        companion.load_content(
            ContentOverride::new()
                .with_tips(CharacterContent::new().with("default", vec!["Only tip".to_string()]))
                .with_verifications(vec![Verification::confirm("Sure?", "sure")]),
        );
        companion.start("avatar", None);
        clock.advance(Duration::from_secs(5));
        companion.tick();

        let tip = observer.interactions().pop().unwrap();
        assert_eq!(tip.message.as_deref(), Some("Only tip"));
    }

    #[test]
    fn test_phase_draws_resolve_per_character() {
        let (mut companion, observer, clock) = companion();
        companion.set_character("pip");
        companion.load_content(
            ContentOverride::new()
                .with_micro_poses(CharacterContent::new().with("pip", vec!["spin".to_string()]))
                .with_tips(CharacterContent::new().with("default", vec!["Shared tip".to_string()]))
                .with_facts(
                    CharacterContent::new()
                        .with("default", vec!["Shared fact".to_string()])
                        .with("pip", vec!["Pip fact".to_string()]),
                ),
        );
        companion.start("avatar", None);

        clock.set(Duration::from_secs(1));
        assert_eq!(companion.tick(), Some(PhaseKind::Micro));
        clock.set(Duration::from_secs(6));
        assert_eq!(companion.tick(), Some(PhaseKind::Tip));
        clock.set(Duration::from_secs(16));
        assert_eq!(companion.tick(), Some(PhaseKind::Fact));

        let shown: Vec<_> = observer
            .interactions()
            .into_iter()
            .map(|i| (i.kind, i.message.unwrap_or(i.pose)))
            .collect();
        assert_eq!(
            shown,
            vec![
                (PhaseKind::Micro, "spin".to_string()),
                (PhaseKind::Tip, "Shared tip".to_string()),
                (PhaseKind::Fact, "Pip fact".to_string()),
            ]
        );
    }

    #[test]
    fn test_failing_observer_does_not_stop_ticks() {
        let observer = RecordingObserver::failing();
        let clock = ManualClock::new();
        let mut companion = Companion::new(CompanionConfig::new(), observer.clone())
            .with_rng(StdRng::seed_from_u64(1))
            .with_clock(clock.clone());

        companion.start("avatar", None);
        clock.advance(Duration::from_secs(6));
        assert_eq!(companion.tick(), Some(PhaseKind::Tip));
        clock.advance(Duration::from_secs(10));
        assert_eq!(companion.tick(), Some(PhaseKind::Fact));
        assert!(!observer.events().is_empty());
    }

    #[test]
    fn test_session_keyed_calls() {
        let (mut companion, observer, _) = companion();
        companion.start("first", None);
        let stale = companion.session_id().unwrap();
        companion.start("second", None);
        observer.clear();

        assert!(!companion.engage_session(stale));
        assert!(!companion.tick_session(stale));
        assert!(observer.events().is_empty());

        let current = companion.session_id().unwrap();
        assert!(companion.engage_session(current));
        assert!(companion.tick_session(current));
    }
}
