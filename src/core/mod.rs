//! Work dispatch and statistics aggregation.

pub mod barrier;
pub mod error;
pub mod high_water;
pub mod manager;
pub mod store;
pub mod work_pool;
pub mod work_unit;

pub use barrier::{CompletionBarrier, CompletionGuard};
pub use error::{AppResult, BenchError};
pub use high_water::{HighWaterMarks, TrialStats};
pub use manager::WorkManager;
pub use store::{compare_values, sort_records, Record, RecordStore, StoreError, StoreSession};
pub use work_pool::{PoolError, PoolGauges, PoolStats, PoolWorker, WorkPool};
pub use work_unit::{QuerySpec, UnitOutcome, WorkUnit};
