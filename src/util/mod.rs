//! Shared utilities.

pub mod fault;
pub mod telemetry;

pub use fault::{contain, panic_message};
pub use telemetry::{init_tracing, logging_switch};
