//! Work manager: owns the pool and the record store for one benchmark run and
//! aggregates the saturation high-water marks its executors report.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::barrier::CompletionBarrier;
use super::error::BenchError;
use super::high_water::{HighWaterMarks, TrialStats};
use super::store::{RecordStore, StoreError};
use super::work_pool::{PoolStats, WorkPool};
use super::work_unit::{QuerySpec, WorkUnit};
use crate::config::PoolConfig;

/// Single authority for pool lifecycle and high-water-mark aggregation.
///
/// Built once by the driver and passed by reference to every call site. A
/// manager either starts fully or not at all; after [`shutdown`](Self::shutdown)
/// it rejects new work with [`BenchError::NotRunning`].
pub struct WorkManager<S: RecordStore> {
    pool: WorkPool<WorkUnit<S>>,
    store: Arc<S>,
    marks: Arc<HighWaterMarks>,
    query: Arc<QuerySpec>,
    running: AtomicBool,
}

impl<S: RecordStore> WorkManager<S> {
    /// Open the record store through `open_store`, start a pool of
    /// `pool_config.worker_count` executors, and zero the high-water marks.
    ///
    /// If the pool cannot start, the already-opened store is closed before the
    /// error is returned.
    ///
    /// # Errors
    ///
    /// - `BenchError::Store` if the store cannot be opened
    /// - `BenchError::Pool` if the pool configuration is invalid or a thread
    ///   cannot be spawned
    pub fn startup<F>(pool_config: PoolConfig, query: QuerySpec, open_store: F) -> Result<Self, BenchError>
    where
        F: FnOnce() -> Result<S, StoreError>,
    {
        info!(
            worker_count = pool_config.worker_count,
            queue_capacity = pool_config.queue_capacity,
            "WorkManager starting"
        );

        let store = Arc::new(open_store()?);

        let pool = match WorkPool::new(pool_config) {
            Ok(pool) => pool,
            Err(e) => {
                warn!(error = %e, "Work pool failed to start; closing record store");
                store.close();
                return Err(e.into());
            }
        };

        info!(store = store.name(), "WorkManager started");
        Ok(Self {
            pool,
            store,
            marks: Arc::new(HighWaterMarks::new()),
            query: Arc::new(query),
            running: AtomicBool::new(true),
        })
    }

    /// Stop admitting work, wait for every admitted unit to finish, then
    /// release the record store.
    ///
    /// # Errors
    ///
    /// Returns `BenchError::NotRunning` if the manager was already shut down.
    pub fn shutdown(&self) -> Result<(), BenchError> {
        if !self.running.swap(false, Ordering::AcqRel) {
            return Err(BenchError::NotRunning);
        }
        info!("WorkManager shutting down");
        self.pool.shutdown();
        self.store.close();
        info!("WorkManager shut down");
        Ok(())
    }

    /// Submit one unit bound to `completion`. Blocks only while the pool's
    /// backlog is full.
    ///
    /// A unit the pool refuses is dropped, which still signals `completion`
    /// so a waiter never hangs on it.
    ///
    /// # Errors
    ///
    /// - `BenchError::NotRunning` after shutdown
    /// - `BenchError::Pool` if the pool refuses the unit
    pub fn post_work(&self, tag: &str, completion: &Arc<CompletionBarrier>) -> Result<(), BenchError> {
        if !self.is_running() {
            return Err(BenchError::NotRunning);
        }
        let unit = WorkUnit::new(
            tag,
            self.pool.gauges(),
            Arc::clone(&self.marks),
            Arc::clone(&self.store),
            Arc::clone(&self.query),
            Arc::clone(completion),
        );
        self.pool.submit(unit)?;
        debug!(tag, "Work posted");
        Ok(())
    }

    /// Raise the stored peaks to the observed values where larger.
    pub fn record_high_water_mark(&self, active_executors: usize, queued_items: usize) {
        self.marks.record(active_executors, queued_items);
    }

    /// Peaks observed since startup. Read after a trial's barrier reaches zero.
    #[must_use]
    pub fn stats(&self) -> TrialStats {
        self.marks.snapshot()
    }

    /// Live pool statistics.
    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Whether the manager accepts work.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Number of pool executors.
    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// Pool backlog capacity.
    #[must_use]
    pub const fn queue_capacity(&self) -> usize {
        self.pool.queue_capacity()
    }

    /// The record store master handle.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }
}

impl<S: RecordStore> Drop for WorkManager<S> {
    fn drop(&mut self) {
        if self.running.swap(false, Ordering::AcqRel) {
            debug!("WorkManager dropped without explicit shutdown - releasing store");
            self.store.close();
        }
    }
}
