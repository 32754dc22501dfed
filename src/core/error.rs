//! Error types for work manager operations.

use thiserror::Error;

use super::store::StoreError;
use super::work_pool::PoolError;

/// Errors produced by the work manager and its collaborators.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The bounded pool rejected its configuration or a submission.
    #[error("work pool: {0}")]
    Pool(#[from] PoolError),
    /// The record store could not be opened or queried.
    #[error("record store: {0}")]
    Store(#[from] StoreError),
    /// Operation invoked outside the startup/shutdown window.
    #[error("work manager is not running")]
    NotRunning,
    /// A panic was contained at a unit boundary.
    #[error("fault in {context}: {message}")]
    Fault {
        /// Where the fault was caught.
        context: String,
        /// Panic payload rendered as text.
        message: String,
    },
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_running_display() {
        assert_eq!(BenchError::NotRunning.to_string(), "work manager is not running");
    }

    #[test]
    fn test_fault_display() {
        let err = BenchError::Fault {
            context: "Rout_0001 : WorkUnit::execute".into(),
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "fault in Rout_0001 : WorkUnit::execute: boom");
    }

    #[test]
    fn test_pool_error_converts() {
        let err: BenchError = PoolError::PoolShutdown.into();
        assert_eq!(err.to_string(), "work pool: pool has been shut down");
    }
}
