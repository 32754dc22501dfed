//! Builders to construct a work manager from configuration.

pub mod manager_builder;

pub use manager_builder::{build_manager, build_manager_with_faults};
