//! Companion configuration.

use crate::phase::{Phase, PhaseError, PhaseKind, PhaseTable};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Character used when none is configured.
pub const DEFAULT_CHARACTER: &str = "kyur";

/// Default period of the phase tick.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1_000);

/// Default delay before the first ambient pose after `start`.
pub const DEFAULT_ENGAGEMENT_DELAY: Duration = Duration::from_millis(500);

/// Errors from building a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} (expected milliseconds)")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    #[error("Too many phase bounds: got {given}, at most {max}")]
    TooManyBounds { given: usize, max: usize },

    #[error("Invalid phase table: {0}")]
    Phase(#[from] PhaseError),
}

/// Configuration for a [`Companion`](crate::Companion).
#[derive(Debug, Clone)]
pub struct CompanionConfig {
    /// Character persona.
    pub character: String,

    /// Phase boundaries.
    pub phases: PhaseTable,

    /// How often elapsed time is re-evaluated. Never zero; set through
    /// [`with_tick_interval`](Self::with_tick_interval).
    tick_interval: Duration,

    /// Delay of the one-shot ambient pose after `start`.
    pub engagement_delay: Duration,

    /// Pose emitted synchronously by `start`.
    pub start_pose: String,

    /// Pose emitted by `stop`.
    pub stop_pose: String,

    /// Optional JSON file overriding built-in content.
    pub content_path: Option<PathBuf>,
}

impl CompanionConfig {
    pub fn new() -> Self {
        Self {
            character: DEFAULT_CHARACTER.to_string(),
            phases: PhaseTable::default(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            engagement_delay: DEFAULT_ENGAGEMENT_DELAY,
            start_pose: "thinking".to_string(),
            stop_pose: "excited".to_string(),
            content_path: None,
        }
    }

    /// Build from `INTERLUDE_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(character) = lookup("INTERLUDE_CHARACTER").filter(|c| !c.trim().is_empty()) {
            config.character = character.trim().to_string();
        }
        if let Some(ms) = parse_ms(&lookup, "INTERLUDE_TICK_MS")? {
            config = config.with_tick_interval(ms)?;
        }
        if let Some(ms) = parse_ms(&lookup, "INTERLUDE_ENGAGEMENT_MS")? {
            config.engagement_delay = ms;
        }
        if let Some(bounds) = lookup("INTERLUDE_PHASE_BOUNDS").filter(|b| !b.trim().is_empty()) {
            config = config.with_phase_bounds(&parse_bounds(&bounds)?)?;
        }
        if let Some(path) = lookup("INTERLUDE_CONTENT").filter(|p| !p.is_empty()) {
            config.content_path = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    pub fn with_character(mut self, character: impl Into<String>) -> Self {
        self.character = character.into();
        self
    }

    pub fn with_phases(mut self, phases: PhaseTable) -> Self {
        self.phases = phases;
        self
    }

    /// Replace the phase table with an explicit list.
    pub fn with_phase_list(self, phases: Vec<Phase>) -> Result<Self, ConfigError> {
        Ok(self.with_phases(PhaseTable::new(phases)?))
    }

    /// Move the boundaries of the default phase sequence.
    ///
    /// `bounds` holds the start of every phase after the first, so the
    /// default table is `[5000, 15000, 30000, 60000]`.
    pub fn with_phase_bounds(self, bounds: &[u64]) -> Result<Self, ConfigError> {
        let max = PhaseKind::ALL.len() - 1;
        if bounds.len() > max {
            return Err(ConfigError::TooManyBounds {
                given: bounds.len(),
                max,
            });
        }

        let mut phases = Vec::with_capacity(PhaseKind::ALL.len());
        let mut start_ms = 0;
        for (i, kind) in PhaseKind::ALL.iter().enumerate() {
            match bounds.get(i) {
                Some(&end_ms) => {
                    phases.push(Phase::new(*kind, start_ms, end_ms));
                    start_ms = end_ms;
                }
                _ => {
                    phases.push(Phase::open(*kind, start_ms));
                    break;
                }
            }
        }
        self.with_phase_list(phases)
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::ZeroInterval("tick interval"));
        }
        self.tick_interval = interval;
        Ok(self)
    }

    pub fn with_engagement_delay(mut self, delay: Duration) -> Self {
        self.engagement_delay = delay;
        self
    }

    pub fn with_start_pose(mut self, pose: impl Into<String>) -> Self {
        self.start_pose = pose.into();
        self
    }

    pub fn with_stop_pose(mut self, pose: impl Into<String>) -> Self {
        self.stop_pose = pose.into();
        self
    }

    pub fn with_content_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.content_path = Some(path.into());
        self
    }
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_ms<F>(lookup: &F, var: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    value
        .trim()
        .parse::<u64>()
        .map(|ms| Some(Duration::from_millis(ms)))
        .map_err(|_| ConfigError::InvalidNumber { var, value })
}

fn parse_bounds(raw: &str) -> Result<Vec<u64>, ConfigError> {
    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "INTERLUDE_PHASE_BOUNDS",
                    value: raw.to_string(),
                })
        })
        .collect()
}
