//! Wait sessions.
//!
//! A session is the interval between `start` and `stop`. It owns the set of
//! content already shown, which is what keeps interactions from repeating.

use crate::phase::{duration_ms, PhaseKind};
use crate::selection::UsedKeys;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Identity of one session. Scheduled work is keyed to it so that timers
/// from an earlier session never act on a later one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of the current (or most recent) session.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    /// Name of the operation being waited on.
    pub process_name: String,
    pub estimated_duration: Option<Duration>,
    /// Clock reading at `start`.
    pub started_at: Duration,
    /// Clock reading at the first `stop`.
    pub stopped_at: Option<Duration>,
    pub used: UsedKeys,
    pub active: bool,
}

impl Session {
    pub fn new(
        process_name: impl Into<String>,
        estimated_duration: Option<Duration>,
        started_at: Duration,
    ) -> Self {
        Self {
            id: SessionId::new(),
            process_name: process_name.into(),
            estimated_duration,
            started_at,
            stopped_at: None,
            used: UsedKeys::new(),
            active: true,
        }
    }

    pub fn elapsed(&self, now: Duration) -> Duration {
        now.saturating_sub(self.started_at)
    }

    /// Fraction of the estimated duration that has passed, capped at 1.
    pub fn progress(&self, now: Duration) -> Option<f32> {
        let estimate = self.estimated_duration?;
        if estimate.is_zero() {
            return Some(1.0);
        }
        let ratio = self.elapsed(now).as_secs_f64() / estimate.as_secs_f64();
        Some(ratio.clamp(0.0, 1.0) as f32)
    }

    /// Summarize the session as of `ended_at`.
    pub fn summary(&self, ended_at: Duration, phase: Option<PhaseKind>) -> SessionSummary {
        SessionSummary {
            session_id: Some(self.id),
            process_name: self.process_name.clone(),
            duration_ms: duration_ms(self.elapsed(ended_at)),
            interactions_shown_count: self.used.len(),
            phase,
        }
    }
}

/// What `stop` reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: Option<SessionId>,
    pub process_name: String,
    pub duration_ms: u64,
    /// Deduplicated draws only; ambient poses are not counted.
    pub interactions_shown_count: usize,
    /// Phase the session was in when it stopped.
    pub phase: Option<PhaseKind>,
}

impl SessionSummary {
    /// Summary for a companion that was never started.
    pub fn never_started() -> Self {
        Self {
            session_id: None,
            process_name: String::new(),
            duration_ms: 0,
            interactions_shown_count: 0,
            phase: None,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}
