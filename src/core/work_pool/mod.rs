//! Bounded work pool with dedicated worker threads.
//!
//! The pool owns a fixed number of executors and an admission-bounded backlog.
//! Submitted work waits in the backlog until an executor is free; when the
//! backlog is full, [`WorkPool::submit`] blocks the submitter until space frees
//! up. Two live gauges are exposed for callers that want to observe saturation:
//! the number of executors currently running work, and the number of items
//! waiting in the backlog.
//!
//! # Example
//!
//! ```rust,ignore
//! use workpool_bench::config::PoolConfig;
//! use workpool_bench::core::{PoolWorker, WorkPool};
//!
//! let pool = WorkPool::new(
//!     PoolConfig::new()
//!         .with_worker_count(4)
//!         .with_queue_capacity(100),
//! )?;
//!
//! pool.submit(my_work)?;
//! println!("active={} queued={}", pool.active_executors(), pool.queued_items());
//! pool.shutdown();
//! ```

mod native;

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

pub use native::WorkPool;

/// A unit of work that can be executed by a pool executor.
///
/// `do_work` runs on a dedicated worker thread inside that thread's own
/// single-threaded tokio runtime, so implementations may await I/O freely.
#[async_trait]
pub trait PoolWorker: Send + 'static {
    /// Perform the work. `worker_id` identifies the executor running it.
    async fn do_work(self, worker_id: usize);
}

/// Errors that can occur when using a `WorkPool`.
#[derive(Debug)]
pub enum PoolError {
    /// The backlog is full; returned only by non-blocking submission.
    QueueFull,

    /// The pool has been shut down.
    PoolShutdown,

    /// Configuration validation failed.
    InvalidConfig(String),

    /// Internal error (thread spawn failure, etc.).
    Internal(String),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => write!(f, "task queue is full"),
            Self::PoolShutdown => write!(f, "pool has been shut down"),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for PoolError {}

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,

    /// Backlog capacity.
    pub queue_capacity: usize,

    /// Executors currently running work.
    pub active_executors: usize,

    /// Items waiting in the backlog.
    pub queued_items: usize,

    /// Total items admitted.
    pub submitted: u64,

    /// Total items whose execution returned normally.
    pub completed: u64,

    /// Total items whose execution panicked out of `do_work`.
    pub panicked: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active: AtomicUsize,
    pub live: AtomicUsize,
    pub submitted: AtomicU64,
    pub completed: AtomicU64,
    pub panicked: AtomicU64,
}

impl PoolCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize, queue_capacity: usize, queued: usize) -> PoolStats {
        PoolStats {
            worker_count,
            queue_capacity,
            active_executors: self.active.load(Ordering::Acquire),
            queued_items: queued,
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
        }
    }
}

/// Read-only handle on a pool's live gauges.
///
/// Cheap to clone; work items keep one so they can sample pool saturation
/// from inside an executor.
#[derive(Clone)]
pub struct PoolGauges {
    counters: Arc<PoolCounters>,
    backlog: Arc<dyn Fn() -> usize + Send + Sync>,
}

impl PoolGauges {
    pub(crate) fn new(counters: Arc<PoolCounters>, backlog: Arc<dyn Fn() -> usize + Send + Sync>) -> Self {
        Self { counters, backlog }
    }

    /// Executors currently running work.
    #[must_use]
    pub fn active_executors(&self) -> usize {
        self.counters.active.load(Ordering::Acquire)
    }

    /// Items admitted but not yet picked up by an executor.
    #[must_use]
    pub fn queued_items(&self) -> usize {
        (self.backlog)()
    }
}

impl fmt::Debug for PoolGauges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolGauges")
            .field("active_executors", &self.active_executors())
            .field("queued_items", &self.queued_items())
            .finish()
    }
}
