//! Tokio driver for a [`Companion`].
//!
//! Each session gets two tasks: a one-shot engagement after the configured
//! delay and a fixed-period tick. Both are keyed to the session id and are
//! aborted together by `stop` or by the next `start`. A single async mutex
//! serializes `start`, `stop`, and every tick.

use crate::companion::Companion;
use crate::content::ContentOverride;
use crate::phase::PhaseKind;
use crate::session::{SessionId, SessionSummary};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// Scheduled work for one session.
struct SessionTasks {
    session: SessionId,
    engagement: JoinHandle<()>,
    tick: JoinHandle<()>,
}

impl SessionTasks {
    fn abort(self) {
        debug!(session = %self.session, "cancelling session timers");
        self.engagement.abort();
        self.tick.abort();
    }
}

struct Shared {
    companion: Companion,
    tasks: Option<SessionTasks>,
}

/// Shareable handle that runs a companion's timers on the tokio runtime.
#[derive(Clone)]
pub struct CompanionHandle {
    shared: Arc<Mutex<Shared>>,
}

impl CompanionHandle {
    pub fn new(companion: Companion) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                companion,
                tasks: None,
            })),
        }
    }

    /// Start a session and schedule its timers. Any previous session's
    /// timers are cancelled first.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(
        &self,
        process_name: impl Into<String>,
        estimated_duration: Option<Duration>,
    ) -> Option<SessionId> {
        let mut shared = self.shared.lock().await;
        if let Some(tasks) = shared.tasks.take() {
            tasks.abort();
        }

        shared.companion.start(process_name, estimated_duration);
        let session = shared.companion.session_id()?;
        let config = shared.companion.config();
        let engagement_delay = config.engagement_delay;
        let tick_interval = config.tick_interval();

        let engagement = tokio::spawn(engage_after(
            Arc::clone(&self.shared),
            session,
            engagement_delay,
        ));
        let tick = tokio::spawn(tick_every(Arc::clone(&self.shared), session, tick_interval));

        shared.tasks = Some(SessionTasks {
            session,
            engagement,
            tick,
        });
        Some(session)
    }

    /// Cancel the session's timers and return its summary. Safe to call
    /// repeatedly.
    pub async fn stop(&self) -> SessionSummary {
        let mut shared = self.shared.lock().await;
        if let Some(tasks) = shared.tasks.take() {
            tasks.abort();
        }
        shared.companion.stop()
    }

    pub async fn elapsed(&self) -> Duration {
        self.shared.lock().await.companion.elapsed()
    }

    pub async fn progress(&self) -> Option<f32> {
        self.shared.lock().await.companion.progress()
    }

    pub async fn current_phase(&self) -> Option<PhaseKind> {
        self.shared.lock().await.companion.current_phase()
    }

    pub async fn is_active(&self) -> bool {
        self.shared.lock().await.companion.is_active()
    }

    pub async fn set_character(&self, character: impl Into<String>) {
        self.shared.lock().await.companion.set_character(character);
    }

    pub async fn load_content(&self, partial: ContentOverride) {
        self.shared.lock().await.companion.load_content(partial);
    }

    /// Run `f` with exclusive access to the companion.
    pub async fn with_companion<T>(&self, f: impl FnOnce(&mut Companion) -> T) -> T {
        let mut shared = self.shared.lock().await;
        f(&mut shared.companion)
    }
}

async fn engage_after(shared: Arc<Mutex<Shared>>, session: SessionId, delay: Duration) {
    time::sleep(delay).await;
    let mut shared = shared.lock().await;
    if !shared.companion.engage_session(session) {
        debug!(session = %session, "engagement skipped; session no longer active");
    }
}

async fn tick_every(shared: Arc<Mutex<Shared>>, session: SessionId, period: Duration) {
    // First tick lands one full period after start.
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        let mut shared = shared.lock().await;
        if !shared.companion.tick_session(session) {
            break;
        }
    }
}
