//! Phase transitions.
//!
//! The scheduler only ever moves forward through its table. Each call to
//! [`PhaseScheduler::advance`] looks at the absolute elapsed time, so a late
//! or skipped tick lands directly on the right phase without replaying the
//! ones in between.

use crate::phase::{PhaseKind, PhaseTable};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PhaseScheduler {
    table: PhaseTable,
    /// Index into `table` of the phase last entered.
    current: Option<usize>,
}

impl PhaseScheduler {
    pub fn new(table: PhaseTable) -> Self {
        Self {
            table,
            current: None,
        }
    }

    pub fn table(&self) -> &PhaseTable {
        &self.table
    }

    /// The phase last entered, if any.
    pub fn current(&self) -> Option<PhaseKind> {
        self.current.map(|i| self.table.phases()[i].kind)
    }

    /// Forget the current phase.
    pub fn reset(&mut self) {
        self.current = None;
    }

    /// Evaluate `elapsed` and return the phase entered by this call.
    ///
    /// Returns `None` when still inside the current phase, and also for an
    /// elapsed time that would move backwards.
    pub fn advance(&mut self, elapsed: Duration) -> Option<PhaseKind> {
        let index = self.table.index_at(elapsed);
        if self.current.is_some_and(|current| index <= current) {
            return None;
        }
        self.current = Some(index);
        Some(self.table.phases()[index].kind)
    }
}

impl Default for PhaseScheduler {
    fn default() -> Self {
        Self::new(PhaseTable::default())
    }
}
