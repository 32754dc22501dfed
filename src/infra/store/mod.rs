//! Record store backends.

pub mod memory;
pub mod seed;

pub use memory::{FaultPlan, InMemoryRecordStore, InMemorySession};
pub use seed::{default_seed, load_seed_file, parse_seed, Collections};
