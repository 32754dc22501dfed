//! Work pool configuration.

use serde::{Deserialize, Serialize};

/// Default executor thread stack size (2 MiB).
pub const DEFAULT_THREAD_STACK_SIZE: usize = 2 * 1024 * 1024;

/// Configuration for a [`WorkPool`](crate::core::WorkPool).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of executor threads.
    pub worker_count: usize,
    /// Maximum items waiting for an executor before `submit` blocks.
    pub queue_capacity: usize,
    /// Stack size for each executor thread, in bytes.
    #[serde(default = "default_stack_size")]
    pub thread_stack_size: usize,
}

const fn default_stack_size() -> usize {
    DEFAULT_THREAD_STACK_SIZE
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            queue_capacity: 100,
            thread_stack_size: DEFAULT_THREAD_STACK_SIZE,
        }
    }
}

impl PoolConfig {
    /// Defaults: one executor per CPU and a backlog of 100.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of executor threads.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the backlog capacity.
    #[must_use]
    pub const fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Set the executor thread stack size.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, thread_stack_size: usize) -> Self {
        self.thread_stack_size = thread_stack_size;
        self
    }

    /// Validate pool configuration values.
    ///
    /// A pool with no executors could admit work it never runs, so zero
    /// executors is rejected. A zero-capacity backlog is a pure hand-off.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.thread_stack_size == 0 {
            return Err("thread_stack_size must be greater than 0".into());
        }
        Ok(())
    }
}
