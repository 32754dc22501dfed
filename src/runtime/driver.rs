//! Benchmark driver: timed bursts of work through a [`WorkManager`].

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::config::BenchConfig;
use crate::core::{BenchError, CompletionBarrier, RecordStore, TrialStats, WorkManager};

/// Tag work is posted under.
pub const DRIVER_TAG: &str = "main";

/// Outcome of one timed burst.
#[derive(Debug, Clone, Serialize)]
pub struct TrialReport {
    /// Zero-based trial index.
    pub trial: usize,
    /// Logical CPUs on the host.
    pub cpus: usize,
    /// Pool executors.
    pub routines: usize,
    /// Units submitted in the burst.
    pub amount_of_work: usize,
    /// Wall-clock time from first submission until the barrier reached zero.
    #[serde(skip)]
    pub duration: Duration,
    /// `duration` in seconds.
    pub duration_secs: f64,
    /// Completion signals the barrier received.
    pub signals: u64,
    /// Manager peaks read after the burst.
    pub stats: TrialStats,
}

impl fmt::Display for TrialReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CPU[{}] Routines[{}] AmountOfWork[{}] Duration[{:.6}] MaxRoutines[{}] MaxQueued[{}]",
            self.cpus,
            self.routines,
            self.amount_of_work,
            self.duration_secs,
            self.stats.max_active_executors,
            self.stats.max_queued_items
        )
    }
}

/// All trials of one run plus their mean duration.
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    /// Identifier for this run.
    pub run_id: Uuid,
    /// Per-trial results in order.
    pub trials: Vec<TrialReport>,
    /// Arithmetic mean of the trial durations, in seconds.
    pub average_secs: f64,
}

impl BenchReport {
    /// Mean trial duration.
    #[must_use]
    pub fn average(&self) -> Duration {
        let durations: Vec<Duration> = self.trials.iter().map(|t| t.duration).collect();
        average_duration(&durations)
    }
}

/// Arithmetic mean of `durations`; zero for an empty slice.
#[must_use]
pub fn average_duration(durations: &[Duration]) -> Duration {
    if durations.is_empty() {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(average_secs(durations))
}

/// Arithmetic mean of `durations` in seconds; zero for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_secs(durations: &[Duration]) -> f64 {
    if durations.is_empty() {
        return 0.0;
    }
    let total: f64 = durations.iter().map(Duration::as_secs_f64).sum();
    total / durations.len() as f64
}

/// Post `amount_of_work` units against one barrier, wait for all of them,
/// and read the manager's peaks.
///
/// # Errors
///
/// Returns the first `post_work` error. Units already posted still signal
/// their barrier, which is discarded.
pub fn run_trial<S: RecordStore>(
    manager: &WorkManager<S>,
    trial: usize,
    amount_of_work: usize,
) -> Result<TrialReport, BenchError> {
    let barrier = Arc::new(CompletionBarrier::with_count(amount_of_work));

    let start = Instant::now();
    for _ in 0..amount_of_work {
        manager.post_work(DRIVER_TAG, &barrier)?;
    }
    barrier.wait();
    let duration = start.elapsed();

    let report = TrialReport {
        trial,
        cpus: num_cpus::get(),
        routines: manager.worker_count(),
        amount_of_work,
        duration,
        duration_secs: duration.as_secs_f64(),
        signals: barrier.signals_received(),
        stats: manager.stats(),
    };

    info!(
        trial,
        duration_secs = report.duration_secs,
        max_active = report.stats.max_active_executors,
        max_queued = report.stats.max_queued_items,
        "Trial complete"
    );
    Ok(report)
}

/// Run `cfg.trials` trials, calling `on_trial` after each, and average them.
///
/// # Errors
///
/// Returns the first trial error.
pub fn run_benchmark<S, F>(manager: &WorkManager<S>, cfg: &BenchConfig, mut on_trial: F) -> Result<BenchReport, BenchError>
where
    S: RecordStore,
    F: FnMut(&TrialReport),
{
    let run_id = Uuid::new_v4();
    info!(%run_id, trials = cfg.trials, amount_of_work = cfg.amount_of_work, "Benchmark starting");

    let mut trials = Vec::with_capacity(cfg.trials);
    for trial in 0..cfg.trials {
        let report = run_trial(manager, trial, cfg.amount_of_work)?;
        on_trial(&report);
        trials.push(report);
    }

    let durations: Vec<Duration> = trials.iter().map(|t| t.duration).collect();
    let average_secs = average_secs(&durations);
    info!(%run_id, average_secs, "Benchmark complete");

    Ok(BenchReport {
        run_id,
        trials,
        average_secs,
    })
}
