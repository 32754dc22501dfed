//! # Workpool Bench
//!
//! A harness that measures how a bounded worker pool handles a fixed burst of
//! independent units of work.
//!
//! Each trial dispatches N units into a pool of fixed capacity, blocks on a
//! countdown barrier until every unit has finished, and records the peak
//! number of busy executors and the peak backlog observed from inside the
//! executors themselves. Several trials are run to produce an average
//! wall-clock duration.
//!
//! ## Pieces
//!
//! - **`WorkPool`**: fixed executor threads behind a bounded crossbeam channel;
//!   a full backlog blocks the submitter
//! - **`WorkUnit`**: samples the pool gauges, copies a record-store session,
//!   runs one sorted read, and signals its barrier exactly once
//! - **`WorkManager`**: owns the pool and the store, and aggregates the
//!   high-water marks reported by every executor under one lock
//! - **`runtime::driver`**: runs the timed trials and averages them
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use workpool_bench::builders::build_manager;
//! use workpool_bench::config::{BenchConfig, StoreConfig};
//! use workpool_bench::core::CompletionBarrier;
//! use workpool_bench::infra::store::default_seed;
//!
//! let manager = build_manager(&BenchConfig::new(4), &StoreConfig::default(), default_seed())?;
//!
//! let barrier = Arc::new(CompletionBarrier::with_count(100));
//! for _ in 0..100 {
//!     manager.post_work("main", &barrier)?;
//! }
//! barrier.wait();
//!
//! let stats = manager.stats();
//! println!("peak executors {} peak backlog {}", stats.max_active_executors, stats.max_queued_items);
//! manager.shutdown()?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Work dispatch, pool, barrier, store abstraction and statistics.
pub mod core;
/// Configuration models for the pool, the store and the run.
pub mod config;
/// Builders to construct a work manager from configuration.
pub mod builders;
/// Record store backends.
pub mod infra;
/// Benchmark driver.
pub mod runtime;
/// Shared utilities.
pub mod util;
