//! Native implementation of `WorkPool` using OS threads.
//!
//! Every executor is a dedicated OS thread with its own single-threaded tokio
//! runtime. All executors receive from one bounded crossbeam channel, which is
//! the admission backlog.
//!
//! # Design Principles
//!
//! - **No polling**: executors block on channel recv until work arrives
//! - **Backpressure by channel**: a full channel blocks `submit`
//! - **Drain on shutdown**: dropping the sender lets executors finish every
//!   admitted item before `recv` reports disconnection
//! - **Liveness**: executors that die early are counted; once none are left,
//!   `submit` fails with `PoolError::Internal` and the backlog is dropped

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::PoolConfig;
use crate::util::fault::panic_message;

use super::{PoolCounters, PoolError, PoolGauges, PoolStats, PoolWorker};

/// How long a blocked `submit` waits between executor liveness checks.
const LIVENESS_POLL: Duration = Duration::from_millis(50);

/// Bounded work pool with dedicated OS threads.
///
/// # Design
///
/// - **Fixed executors**: `worker_count` threads, spawned up front
/// - **Bounded backlog**: at most `queue_capacity` items wait for an executor
/// - **Lock-free gauges**: atomics and the channel length, no lock on reads
pub struct WorkPool<W: PoolWorker> {
    /// Pool configuration.
    config: PoolConfig,

    /// Work sender (to executors). Option allows clean shutdown by dropping.
    task_tx: Mutex<Option<Sender<W>>>,

    /// Receiver kept for dropping orphaned work once no executor is left.
    task_rx: Receiver<W>,

    /// Pool statistics counters (lock-free atomics).
    counters: Arc<PoolCounters>,

    /// Live gauges shared with work items.
    gauges: PoolGauges,

    /// Shutdown flag (lock-free atomic).
    shutdown: AtomicBool,

    /// Executor thread handles.
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl<W: PoolWorker> WorkPool<W> {
    /// Create a new pool, spawning `config.worker_count` executor threads.
    ///
    /// # Errors
    ///
    /// - `PoolError::InvalidConfig` if the configuration is invalid
    /// - `PoolError::Internal` if an executor thread cannot be spawned
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let (task_tx, task_rx) = bounded::<W>(config.queue_capacity);
        let counters = Arc::new(PoolCounters::default());

        let backlog_rx = task_rx.clone();
        let gauges = PoolGauges::new(Arc::clone(&counters), Arc::new(move || backlog_rx.len()));

        let mut workers = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count {
            let worker = spawn_worker(
                worker_id,
                task_rx.clone(),
                Arc::clone(&counters),
                config.thread_stack_size,
            )?;
            workers.push(worker);
        }

        info!(
            worker_count = config.worker_count,
            queue_capacity = config.queue_capacity,
            "WorkPool initialized with dedicated OS threads"
        );

        Ok(Self {
            config,
            task_tx: Mutex::new(Some(task_tx)),
            task_rx,
            counters,
            gauges,
            shutdown: AtomicBool::new(false),
            workers: Mutex::new(workers),
        })
    }

    /// Submit work, blocking while the backlog is full.
    ///
    /// The sender is cloned out of its lock before sending, so a blocked
    /// submitter never holds a pool lock. While blocked, the submitter
    /// rechecks every `LIVENESS_POLL` that at least one executor is alive.
    ///
    /// # Errors
    ///
    /// - `PoolError::PoolShutdown` if the pool has been shut down
    /// - `PoolError::Internal` if every executor has exited; `work` and any
    ///   queued items are dropped
    pub fn submit(&self, mut work: W) -> Result<(), PoolError> {
        let task_tx = self.sender()?;
        loop {
            self.ensure_live()?;
            match task_tx.send_timeout(work, LIVENESS_POLL) {
                Ok(()) => break,
                Err(SendTimeoutError::Timeout(returned)) => work = returned,
                Err(SendTimeoutError::Disconnected(_)) => return Err(PoolError::PoolShutdown),
            }
        }
        self.ensure_live()?;
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Submit work without blocking.
    ///
    /// # Errors
    ///
    /// - `PoolError::QueueFull` if the backlog is full
    /// - `PoolError::PoolShutdown` if the pool has been shut down
    /// - `PoolError::Internal` if every executor has exited
    pub fn try_submit(&self, work: W) -> Result<(), PoolError> {
        let task_tx = self.sender()?;
        self.ensure_live()?;
        match task_tx.try_send(work) {
            Ok(()) => {
                self.ensure_live()?;
                self.counters.submitted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                warn!("Work pool queue is full");
                Err(PoolError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => Err(PoolError::PoolShutdown),
        }
    }

    /// Fail if no executor is left, dropping whatever is still queued so
    /// the items' own cleanup runs. Executors leaving during shutdown have
    /// already drained the backlog and do not count.
    fn ensure_live(&self) -> Result<(), PoolError> {
        if self.counters.live.load(Ordering::Acquire) > 0 || self.is_shutdown() {
            return Ok(());
        }
        let dropped = self.task_rx.try_iter().count();
        error!(dropped, "No live executors left in work pool");
        Err(PoolError::Internal("no live executors".into()))
    }

    /// Executor threads still serving the backlog.
    #[must_use]
    pub fn live_workers(&self) -> usize {
        self.counters.live.load(Ordering::Acquire)
    }

    fn sender(&self) -> Result<Sender<W>, PoolError> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(PoolError::PoolShutdown);
        }
        self.task_tx.lock().as_ref().cloned().ok_or(PoolError::PoolShutdown)
    }

    /// Executors currently running work.
    #[must_use]
    pub fn active_executors(&self) -> usize {
        self.gauges.active_executors()
    }

    /// Items waiting in the backlog.
    #[must_use]
    pub fn queued_items(&self) -> usize {
        self.gauges.queued_items()
    }

    /// A cloneable handle on the live gauges.
    #[must_use]
    pub fn gauges(&self) -> PoolGauges {
        self.gauges.clone()
    }

    /// Number of executor threads.
    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.config.worker_count
    }

    /// Backlog capacity.
    #[must_use]
    pub const fn queue_capacity(&self) -> usize {
        self.config.queue_capacity
    }

    /// Whether `shutdown` has been called.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(
            self.config.worker_count,
            self.config.queue_capacity,
            self.gauges.queued_items(),
        )
    }

    /// Stop accepting work and wait for every admitted item to finish.
    ///
    /// Dropping the sender does not discard the backlog: executors keep
    /// receiving until the channel is both empty and disconnected.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        info!("Shutting down work pool");

        {
            let mut task_tx = self.task_tx.lock();
            *task_tx = None;
        }

        let workers: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        let worker_count = workers.len();

        for (idx, worker) in workers.into_iter().enumerate() {
            if worker.join().is_ok() {
                debug!(worker_id = idx, "Worker joined successfully");
            } else {
                warn!(worker_id = idx, "Worker thread panicked");
            }
        }

        info!(worker_count = worker_count, "Work pool shut down complete");
    }
}

impl<W: PoolWorker> Drop for WorkPool<W> {
    fn drop(&mut self) {
        // Signal shutdown but don't join; explicit shutdown() drains.
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            let mut task_tx = self.task_tx.lock();
            *task_tx = None;
            debug!("WorkPool dropped without explicit shutdown - workers will be detached");
        }
    }
}

/// Counts one executor as live until dropped. The last executor to leave
/// drops whatever is still queued, since nothing else will receive it.
struct LiveWorker<W> {
    worker_id: usize,
    counters: Arc<PoolCounters>,
    task_rx: Receiver<W>,
}

impl<W> LiveWorker<W> {
    fn enter(worker_id: usize, counters: &Arc<PoolCounters>, task_rx: Receiver<W>) -> Self {
        counters.live.fetch_add(1, Ordering::AcqRel);
        Self {
            worker_id,
            counters: Arc::clone(counters),
            task_rx,
        }
    }
}

impl<W> Drop for LiveWorker<W> {
    fn drop(&mut self) {
        if self.counters.live.fetch_sub(1, Ordering::AcqRel) != 1 {
            return;
        }
        let dropped = self.task_rx.try_iter().count();
        if dropped > 0 {
            error!(
                worker_id = self.worker_id,
                dropped, "Last executor exited with work still queued; queued work dropped"
            );
        }
    }
}

fn build_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread().enable_all().build()
}

/// Spawn an executor thread.
fn spawn_worker<W: PoolWorker>(
    worker_id: usize,
    task_rx: Receiver<W>,
    counters: Arc<PoolCounters>,
    stack_size: usize,
) -> Result<JoinHandle<()>, PoolError> {
    let live = LiveWorker::enter(worker_id, &counters, task_rx);
    thread::Builder::new()
        .name(format!("wp-worker-{worker_id}"))
        .stack_size(stack_size)
        .spawn(move || {
            debug!(worker_id = worker_id, "Worker thread started");

            let mut rt = match build_runtime() {
                Ok(rt) => rt,
                Err(e) => {
                    error!(worker_id = worker_id, error = %e, "Failed to create worker runtime");
                    return;
                }
            };

            // Blocking recv; returns Err only once the backlog is empty and
            // every sender is gone.
            while let Ok(work) = live.task_rx.recv() {
                counters.active.fetch_add(1, Ordering::AcqRel);

                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    rt.block_on(work.do_work(worker_id));
                }));

                counters.active.fetch_sub(1, Ordering::AcqRel);

                match outcome {
                    Ok(()) => {
                        counters.completed.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(payload) => {
                        counters.panicked.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            worker_id = worker_id,
                            panic = %panic_message(payload.as_ref()),
                            "Work panicked out of executor; executor continues"
                        );
                        // A runtime unwound through block_on is not reused.
                        match build_runtime() {
                            Ok(fresh) => rt = fresh,
                            Err(e) => {
                                error!(worker_id = worker_id, error = %e, "Failed to rebuild worker runtime");
                                return;
                            }
                        }
                    }
                }
            }

            debug!(worker_id = worker_id, "Worker channel closed, exiting");
        })
        .map_err(|e| PoolError::Internal(format!("failed to spawn worker {worker_id}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Condvar;
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    /// Work that counts its executions after a short sleep.
    struct CountingWork {
        executed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PoolWorker for CountingWork {
        async fn do_work(self, _worker_id: usize) {
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.executed.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Work that blocks its executor until the gate opens.
    struct GatedWork {
        gate: Arc<(Mutex<bool>, Condvar)>,
    }

    #[async_trait]
    impl PoolWorker for GatedWork {
        async fn do_work(self, _worker_id: usize) {
            let (lock, cvar) = &*self.gate;
            let mut open = lock.lock();
            while !*open {
                cvar.wait(&mut open);
            }
        }
    }

    fn wait_until(mut check: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !check() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_pool_executes_all_work() {
        let executed = Arc::new(AtomicUsize::new(0));
        let pool = WorkPool::new(PoolConfig::new().with_worker_count(4).with_queue_capacity(8)).unwrap();

        for _ in 0..32 {
            pool.submit(CountingWork { executed: Arc::clone(&executed) }).unwrap();
        }
        pool.shutdown();

        assert_eq!(executed.load(Ordering::SeqCst), 32);
        let stats = pool.stats();
        assert_eq!(stats.submitted, 32);
        assert_eq!(stats.completed, 32);
        assert_eq!(stats.active_executors, 0);
        assert_eq!(stats.queued_items, 0);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = WorkPool::<CountingWork>::new(PoolConfig::new().with_worker_count(0));
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let pool = WorkPool::new(PoolConfig::new().with_worker_count(1)).unwrap();
        pool.shutdown();
        let executed = Arc::new(AtomicUsize::new(0));
        let result = pool.submit(CountingWork { executed });
        assert!(matches!(result, Err(PoolError::PoolShutdown)));
        assert!(pool.is_shutdown());
    }

    #[test]
    fn test_try_submit_reports_full_backlog() {
        let gate = Arc::new((Mutex::new(false), Condvar::new()));
        let pool = WorkPool::new(PoolConfig::new().with_worker_count(1).with_queue_capacity(1)).unwrap();

        pool.submit(GatedWork { gate: Arc::clone(&gate) }).unwrap();
        wait_until(|| pool.active_executors() == 1);

        pool.try_submit(GatedWork { gate: Arc::clone(&gate) }).unwrap();
        assert_eq!(pool.queued_items(), 1);

        let third = pool.try_submit(GatedWork { gate: Arc::clone(&gate) });
        assert!(matches!(third, Err(PoolError::QueueFull)));

        {
            let (lock, cvar) = &*gate;
            *lock.lock() = true;
            cvar.notify_all();
        }
        pool.shutdown();
        assert_eq!(pool.stats().completed, 2);
    }

    #[test]
    fn test_active_never_exceeds_worker_count() {
        let gate = Arc::new((Mutex::new(false), Condvar::new()));
        let pool = WorkPool::new(PoolConfig::new().with_worker_count(2).with_queue_capacity(4)).unwrap();

        for _ in 0..6 {
            pool.submit(GatedWork { gate: Arc::clone(&gate) }).unwrap();
        }
        wait_until(|| pool.active_executors() == 2);
        assert_eq!(pool.queued_items(), 4);

        {
            let (lock, cvar) = &*gate;
            *lock.lock() = true;
            cvar.notify_all();
        }
        pool.shutdown();
        assert_eq!(pool.stats().completed, 6);
    }

    /// Work that records being dropped, run or not.
    struct DropCounted {
        dropped: Arc<AtomicUsize>,
    }

    impl Drop for DropCounted {
        fn drop(&mut self) {
            self.dropped.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl PoolWorker for DropCounted {
        async fn do_work(self, _worker_id: usize) {}
    }

    #[test]
    fn test_blocked_submit_fails_once_no_executor_is_live() {
        let gate = Arc::new((Mutex::new(false), Condvar::new()));
        let pool = Arc::new(WorkPool::new(PoolConfig::new().with_worker_count(1).with_queue_capacity(1)).unwrap());
        assert_eq!(pool.live_workers(), 1);

        pool.submit(GatedWork { gate: Arc::clone(&gate) }).unwrap();
        wait_until(|| pool.active_executors() == 1);
        pool.submit(GatedWork { gate: Arc::clone(&gate) }).unwrap();

        let blocked = {
            let pool = Arc::clone(&pool);
            let gate = Arc::clone(&gate);
            thread::spawn(move || pool.submit(GatedWork { gate }))
        };
        thread::sleep(Duration::from_millis(20));
        assert!(!blocked.is_finished());

        // Stand in for the executor dying while the submitter is blocked.
        pool.counters.live.store(0, Ordering::Release);
        let result = blocked.join().unwrap();
        assert!(matches!(result, Err(PoolError::Internal(_))));
        assert_eq!(pool.queued_items(), 0);

        pool.counters.live.store(1, Ordering::Release);
        {
            let (lock, cvar) = &*gate;
            *lock.lock() = true;
            cvar.notify_all();
        }
        pool.shutdown();
        assert_eq!(pool.live_workers(), 0);
    }

    #[test]
    fn test_last_executor_drops_queued_work() {
        let counters = Arc::new(PoolCounters::default());
        let dropped = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = bounded::<DropCounted>(4);

        let first = LiveWorker::enter(0, &counters, rx.clone());
        let second = LiveWorker::enter(1, &counters, rx);
        for _ in 0..3 {
            tx.send(DropCounted { dropped: Arc::clone(&dropped) }).unwrap();
        }

        drop(first);
        assert_eq!(dropped.load(Ordering::SeqCst), 0);
        assert_eq!(counters.live.load(Ordering::SeqCst), 1);

        drop(second);
        assert_eq!(dropped.load(Ordering::SeqCst), 3);
        assert_eq!(counters.live.load(Ordering::SeqCst), 0);
    }
}
