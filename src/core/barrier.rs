//! Countdown latch used to wait for a burst of work units.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::warn;

#[derive(Debug, Default)]
struct BarrierState {
    remaining: usize,
    signals: u64,
    overflows: u64,
}

/// Caller-owned countdown latch: arm with N, each unit calls [`done`](Self::done)
/// once, and [`wait`](Self::wait) blocks until the count reaches zero.
///
/// The latch also counts every signal it receives, so a caller can check that
/// exactly one signal arrived per submitted unit.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use workpool_bench::core::CompletionBarrier;
///
/// let barrier = Arc::new(CompletionBarrier::with_count(3));
/// for _ in 0..3 {
///     let barrier = Arc::clone(&barrier);
///     thread::spawn(move || {
///         barrier.done();
///     });
/// }
/// barrier.wait();
/// assert_eq!(barrier.signals_received(), 3);
/// ```
#[derive(Debug, Default)]
pub struct CompletionBarrier {
    state: Mutex<BarrierState>,
    zero: Condvar,
}

impl CompletionBarrier {
    /// Create an unarmed barrier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a barrier armed with `count`.
    #[must_use]
    pub fn with_count(count: usize) -> Self {
        let barrier = Self::new();
        barrier.arm(count);
        barrier
    }

    /// Add `count` expected signals.
    pub fn arm(&self, count: usize) {
        self.state.lock().remaining += count;
    }

    /// Record one completion. Returns `false` if the barrier was already at
    /// zero; such extra signals are counted separately and never wrap.
    pub fn done(&self) -> bool {
        let mut state = self.state.lock();
        if state.remaining == 0 {
            state.overflows += 1;
            drop(state);
            warn!("completion signalled on a barrier that was already at zero");
            return false;
        }
        state.remaining -= 1;
        state.signals += 1;
        if state.remaining == 0 {
            self.zero.notify_all();
        }
        true
    }

    /// Block until the count reaches zero.
    pub fn wait(&self) {
        let mut state = self.state.lock();
        while state.remaining > 0 {
            self.zero.wait(&mut state);
        }
    }

    /// Block until the count reaches zero or `timeout` elapses.
    /// Returns `true` if zero was reached.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.remaining > 0 {
            if self.zero.wait_until(&mut state, deadline).timed_out() {
                return state.remaining == 0;
            }
        }
        true
    }

    /// Signals still expected.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.state.lock().remaining
    }

    /// Signals accepted so far.
    #[must_use]
    pub fn signals_received(&self) -> u64 {
        self.state.lock().signals
    }

    /// Signals received after the count had already reached zero.
    #[must_use]
    pub fn overflow_signals(&self) -> u64 {
        self.state.lock().overflows
    }
}

/// Fires its barrier exactly once: explicitly through [`fire`](Self::fire),
/// or on drop, including while unwinding.
#[derive(Debug)]
pub struct CompletionGuard {
    barrier: Option<Arc<CompletionBarrier>>,
}

impl CompletionGuard {
    /// Guard that will signal `barrier`.
    #[must_use]
    pub fn new(barrier: Arc<CompletionBarrier>) -> Self {
        Self {
            barrier: Some(barrier),
        }
    }

    /// Signal now instead of on drop.
    pub fn fire(mut self) {
        self.signal();
    }

    fn signal(&mut self) {
        if let Some(barrier) = self.barrier.take() {
            barrier.done();
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.signal();
    }
}
