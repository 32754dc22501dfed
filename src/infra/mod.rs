//! Infrastructure adapters for the record store.

pub mod store;

pub use store::{InMemoryRecordStore, InMemorySession};
