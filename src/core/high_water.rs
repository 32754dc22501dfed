//! High-water-mark tracking for pool saturation.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Snapshot of the peak saturation observed so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialStats {
    /// Largest number of executors seen running at once.
    pub max_active_executors: usize,
    /// Largest backlog seen.
    pub max_queued_items: usize,
}

/// Pair of monotonically non-decreasing counters shared by every executor.
///
/// Both fields are compared and stored under one lock so concurrent
/// observations can never lose an update.
#[derive(Debug, Default)]
pub struct HighWaterMarks {
    peaks: Mutex<TrialStats>,
}

impl HighWaterMarks {
    /// Counters starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the larger of the stored and observed value for each field.
    pub fn record(&self, active_executors: usize, queued_items: usize) {
        let mut peaks = self.peaks.lock();
        peaks.max_active_executors = peaks.max_active_executors.max(active_executors);
        peaks.max_queued_items = peaks.max_queued_items.max(queued_items);
    }

    /// Current peaks.
    #[must_use]
    pub fn snapshot(&self) -> TrialStats {
        *self.peaks.lock()
    }
}
