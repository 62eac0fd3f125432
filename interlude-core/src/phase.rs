//! Wait phases and the phase table.
//!
//! A phase table is an ordered, contiguous partition of elapsed wait time
//! starting at zero and ending in a single unbounded phase. Tables are
//! validated when built, so lookups never fail.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors from building a phase table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhaseError {
    #[error("Phase table is empty")]
    Empty,

    #[error("First phase must start at 0ms, found {start_ms}ms")]
    NotAnchored { start_ms: u64 },

    #[error("Phase {phase} ends at {end_ms}ms but {next} starts at {next_start_ms}ms")]
    NotContiguous {
        phase: PhaseKind,
        end_ms: u64,
        next: PhaseKind,
        next_start_ms: u64,
    },

    #[error("Phase {phase} has an empty range ({start_ms}ms..{end_ms}ms)")]
    EmptyRange {
        phase: PhaseKind,
        start_ms: u64,
        end_ms: u64,
    },

    #[error("Phase {0} is unbounded but is not the last phase")]
    UnboundedBeforeEnd(PhaseKind),

    #[error("Last phase {0} must be unbounded")]
    BoundedTail(PhaseKind),

    #[error("Phase {0} appears more than once")]
    Duplicate(PhaseKind),
}

/// The kinds of phase a wait moves through.
///
/// Each kind owns exactly one content draw, performed when the phase is
/// entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Micro,
    Tip,
    Fact,
    Verify,
    Discover,
}

impl PhaseKind {
    /// All phase kinds in their default order.
    pub const ALL: [PhaseKind; 5] = [
        PhaseKind::Micro,
        PhaseKind::Tip,
        PhaseKind::Fact,
        PhaseKind::Verify,
        PhaseKind::Discover,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::Micro => "micro",
            PhaseKind::Tip => "tip",
            PhaseKind::Fact => "fact",
            PhaseKind::Verify => "verify",
            PhaseKind::Discover => "discover",
        }
    }

    /// Logical pose shown when this phase's content is presented.
    ///
    /// Micro phases draw their pose from content instead.
    pub fn pose(&self) -> &'static str {
        match self {
            PhaseKind::Micro => "idle",
            PhaseKind::Tip => "pointing",
            PhaseKind::Fact => "curious",
            PhaseKind::Verify => "asking",
            PhaseKind::Discover => "presenting",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One time-bounded segment of a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub kind: PhaseKind,
    /// Inclusive lower bound.
    pub start_ms: u64,
    /// Exclusive upper bound; `None` means the phase never ends.
    pub end_ms: Option<u64>,
}

impl Phase {
    pub fn new(kind: PhaseKind, start_ms: u64, end_ms: u64) -> Self {
        Self {
            kind,
            start_ms,
            end_ms: Some(end_ms),
        }
    }

    /// A phase that lasts from `start_ms` forever.
    pub fn open(kind: PhaseKind, start_ms: u64) -> Self {
        Self {
            kind,
            start_ms,
            end_ms: None,
        }
    }

    /// Whether `elapsed_ms` falls inside `[start, end)`.
    pub fn contains(&self, elapsed_ms: u64) -> bool {
        elapsed_ms >= self.start_ms && self.end_ms.map_or(true, |end| elapsed_ms < end)
    }
}

/// A validated, ordered phase table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PhaseTable {
    phases: Vec<Phase>,
}

impl PhaseTable {
    /// Build a table, rejecting anything that is not a contiguous partition
    /// of `[0, inf)`.
    pub fn new(phases: Vec<Phase>) -> Result<Self, PhaseError> {
        let (first, last) = match (phases.first(), phases.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(PhaseError::Empty),
        };

        if first.start_ms != 0 {
            return Err(PhaseError::NotAnchored {
                start_ms: first.start_ms,
            });
        }
        if last.end_ms.is_some() {
            return Err(PhaseError::BoundedTail(last.kind));
        }

        for (i, phase) in phases.iter().enumerate() {
            if phases[..i].iter().any(|p| p.kind == phase.kind) {
                return Err(PhaseError::Duplicate(phase.kind));
            }

            let Some(next) = phases.get(i + 1) else {
                continue;
            };
            let end_ms = phase
                .end_ms
                .ok_or(PhaseError::UnboundedBeforeEnd(phase.kind))?;
            if end_ms <= phase.start_ms {
                return Err(PhaseError::EmptyRange {
                    phase: phase.kind,
                    start_ms: phase.start_ms,
                    end_ms,
                });
            }
            if end_ms != next.start_ms {
                return Err(PhaseError::NotContiguous {
                    phase: phase.kind,
                    end_ms,
                    next: next.kind,
                    next_start_ms: next.start_ms,
                });
            }
        }

        Ok(Self { phases })
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Index of the phase containing `elapsed`.
    pub fn index_at(&self, elapsed: Duration) -> usize {
        let elapsed_ms = duration_ms(elapsed);
        // Contiguity makes the last phase starting at or before `elapsed` the
        // containing one.
        self.phases
            .iter()
            .rposition(|p| p.start_ms <= elapsed_ms)
            .unwrap_or(0)
    }

    /// The phase containing `elapsed`.
    pub fn phase_at(&self, elapsed: Duration) -> &Phase {
        &self.phases[self.index_at(elapsed)]
    }

    /// Position of a phase kind in this table, if present.
    pub fn position(&self, kind: PhaseKind) -> Option<usize> {
        self.phases.iter().position(|p| p.kind == kind)
    }
}

impl Default for PhaseTable {
    fn default() -> Self {
        Self {
            phases: vec![
                Phase::new(PhaseKind::Micro, 0, 5_000),
                Phase::new(PhaseKind::Tip, 5_000, 15_000),
                Phase::new(PhaseKind::Fact, 15_000, 30_000),
                Phase::new(PhaseKind::Verify, 30_000, 60_000),
                Phase::open(PhaseKind::Discover, 60_000),
            ],
        }
    }
}

impl<'de> Deserialize<'de> for PhaseTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let phases = Vec::<Phase>::deserialize(deserializer)?;
        PhaseTable::new(phases).map_err(serde::de::Error::custom)
    }
}

/// Milliseconds in a duration, saturating at `u64::MAX`.
pub(crate) fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
