//! Benchmark driver.

pub mod driver;

pub use driver::{average_duration, average_secs, run_benchmark, run_trial, BenchReport, TrialReport, DRIVER_TAG};
