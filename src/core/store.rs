//! Record store client abstraction.
//!
//! A store is opened once into a master handle. Each work unit copies an
//! independent session from it, runs one read, and drops the session; dropping
//! is the release, so it happens on every exit path.

use std::cmp::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// One document returned by a query.
pub type Record = serde_json::Map<String, Value>;

/// Errors produced by record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The master connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),
    /// A per-unit session could not be copied from the master.
    #[error("session unavailable: {0}")]
    Session(String),
    /// The read failed.
    #[error("query on `{collection}` failed: {reason}")]
    Query {
        /// Collection queried.
        collection: String,
        /// Backend description of the failure.
        reason: String,
    },
    /// The operation exceeded the configured timeout.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
    /// The master handle has been closed.
    #[error("store is closed")]
    Closed,
}

/// Master handle of a record store.
pub trait RecordStore: Send + Sync + 'static {
    /// Per-unit session type.
    type Session: StoreSession;

    /// Short backend name for logging.
    fn name(&self) -> &str;

    /// Copy an independent session from the master connection.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Session` or `StoreError::Closed` when no session
    /// can be handed out.
    fn copy_session(&self) -> Result<Self::Session, StoreError>;

    /// Release the master connection. Sessions already copied stay usable
    /// until dropped; new copies fail with `StoreError::Closed`.
    fn close(&self);
}

/// A session copied from the master; released on drop.
#[async_trait]
pub trait StoreSession: Send + Sync + 'static {
    /// Read every record of `collection`, ascending by `sort_key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Query` or `StoreError::Timeout` on failure.
    async fn query(&self, collection: &str, sort_key: &str) -> Result<Vec<Record>, StoreError>;
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None => 0,
        Some(Value::Null) => 1,
        Some(Value::Bool(_)) => 2,
        Some(Value::Number(_)) => 3,
        Some(Value::String(_)) => 4,
        Some(Value::Array(_)) => 5,
        Some(Value::Object(_)) => 6,
    }
}

/// Order two optional field values: missing first, then null, booleans,
/// numbers (numerically), strings (lexically), arrays and objects.
#[must_use]
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Stable ascending sort of `records` by the field `sort_key`.
pub fn sort_records(records: &mut [Record], sort_key: &str) {
    records.sort_by(|a, b| compare_values(a.get(sort_key), b.get(sort_key)));
}
