//! Integration tests for WorkPool
//!
//! These tests validate the bounded pool on its own:
//! - Every submitted item runs exactly once
//! - Gauges stay within worker count and backlog capacity
//! - A full backlog blocks `submit` and rejects `try_submit`
//! - Panicking work does not kill an executor
//! - Shutdown drains the backlog

use async_trait::async_trait;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use workpool_bench::config::PoolConfig;
use workpool_bench::core::{PoolError, PoolGauges, PoolWorker, WorkPool};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

type Gate = Arc<(Mutex<bool>, Condvar)>;

fn gate() -> Gate {
    Arc::new((Mutex::new(false), Condvar::new()))
}

fn open(gate: &Gate) {
    let (lock, cvar) = &**gate;
    *lock.lock() = true;
    cvar.notify_all();
}

fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(1));
    }
}

fn pool<W: PoolWorker>(workers: usize, capacity: usize) -> WorkPool<W> {
    WorkPool::new(PoolConfig::new().with_worker_count(workers).with_queue_capacity(capacity)).unwrap()
}

// ============================================================================
// TEST WORK ITEMS
// ============================================================================

struct Sampling {
    gauges: PoolGauges,
    peaks: Arc<Mutex<(usize, usize)>>,
    done: Arc<AtomicUsize>,
}

#[async_trait]
impl PoolWorker for Sampling {
    async fn do_work(self, _worker_id: usize) {
        {
            let mut peaks = self.peaks.lock();
            peaks.0 = peaks.0.max(self.gauges.active_executors());
            peaks.1 = peaks.1.max(self.gauges.queued_items());
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
        self.done.fetch_add(1, Ordering::SeqCst);
    }
}

struct Gated {
    gate: Gate,
    done: Arc<AtomicUsize>,
}

#[async_trait]
impl PoolWorker for Gated {
    async fn do_work(self, _worker_id: usize) {
        let (lock, cvar) = &*self.gate;
        let mut opened = lock.lock();
        while !*opened {
            cvar.wait(&mut opened);
        }
        drop(opened);
        self.done.fetch_add(1, Ordering::SeqCst);
    }
}

struct MaybePanic {
    panic: bool,
    done: Arc<AtomicUsize>,
}

#[async_trait]
impl PoolWorker for MaybePanic {
    async fn do_work(self, _worker_id: usize) {
        assert!(!self.panic, "work item failed");
        self.done.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// EXECUTION
// ============================================================================

#[test]
fn test_gauges_bounded_under_load() {
    let pool: WorkPool<Sampling> = pool(4, 8);
    let peaks = Arc::new(Mutex::new((0, 0)));
    let done = Arc::new(AtomicUsize::new(0));

    for _ in 0..200 {
        pool.submit(Sampling {
            gauges: pool.gauges(),
            peaks: Arc::clone(&peaks),
            done: Arc::clone(&done),
        })
        .unwrap();
    }
    pool.shutdown();

    assert_eq!(done.load(Ordering::SeqCst), 200);
    let (active, queued) = *peaks.lock();
    assert!((1..=4).contains(&active), "active peak {active}");
    assert!(queued <= 8, "queued peak {queued}");
    assert_eq!(pool.stats().completed, 200);
}

#[test]
fn test_submit_blocks_while_backlog_full() {
    let pool = Arc::new(pool::<Gated>(1, 1));
    let gate = gate();
    let done = Arc::new(AtomicUsize::new(0));
    let item = || Gated {
        gate: Arc::clone(&gate),
        done: Arc::clone(&done),
    };

    pool.submit(item()).unwrap();
    wait_until(|| pool.active_executors() == 1);
    pool.submit(item()).unwrap();
    assert!(matches!(pool.try_submit(item()), Err(PoolError::QueueFull)));

    let submitter = {
        let pool = Arc::clone(&pool);
        let third = item();
        thread::spawn(move || pool.submit(third))
    };
    thread::sleep(Duration::from_millis(50));
    assert!(!submitter.is_finished(), "submit returned with a full backlog");

    open(&gate);
    submitter.join().unwrap().unwrap();
    pool.shutdown();
    assert_eq!(done.load(Ordering::SeqCst), 3);
}

#[test]
fn test_panicking_item_does_not_stop_executor() {
    let pool: WorkPool<MaybePanic> = pool(1, 10);
    let done = Arc::new(AtomicUsize::new(0));

    for i in 0..6 {
        pool.submit(MaybePanic {
            panic: i % 3 == 0,
            done: Arc::clone(&done),
        })
        .unwrap();
    }
    pool.shutdown();

    let stats = pool.stats();
    assert_eq!(done.load(Ordering::SeqCst), 4);
    assert_eq!(stats.panicked, 2);
    assert_eq!(stats.completed, 4);
}

// ============================================================================
// LIFECYCLE
// ============================================================================

#[test]
fn test_shutdown_drains_queued_items() {
    let pool: WorkPool<Gated> = pool(2, 16);
    let gate = gate();
    let done = Arc::new(AtomicUsize::new(0));

    for _ in 0..16 {
        pool.submit(Gated {
            gate: Arc::clone(&gate),
            done: Arc::clone(&done),
        })
        .unwrap();
    }
    open(&gate);
    pool.shutdown();

    assert!(pool.is_shutdown());
    assert_eq!(done.load(Ordering::SeqCst), 16);
    assert_eq!(pool.queued_items(), 0);
    assert_eq!(pool.active_executors(), 0);
}

#[test]
fn test_submit_after_shutdown_rejected() {
    let pool: WorkPool<MaybePanic> = pool(1, 1);
    pool.shutdown();
    let result = pool.submit(MaybePanic {
        panic: false,
        done: Arc::new(AtomicUsize::new(0)),
    });
    assert!(matches!(result, Err(PoolError::PoolShutdown)));
}

#[test]
fn test_zero_workers_rejected() {
    let result = WorkPool::<MaybePanic>::new(PoolConfig::new().with_worker_count(0));
    assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
}
