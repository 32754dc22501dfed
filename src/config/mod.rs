//! Configuration models for the pool, the record store, and the benchmark run.

pub mod bench;
pub mod pool;
pub mod store;

pub use bench::{BenchConfig, BenchOverrides};
pub use pool::PoolConfig;
pub use store::{Consistency, StoreConfig};
