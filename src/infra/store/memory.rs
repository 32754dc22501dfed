//! In-memory record store with latency and fault injection.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::seed::Collections;
use crate::config::{Consistency, StoreConfig};
use crate::core::{sort_records, Record, RecordStore, StoreError, StoreSession};

/// Failures to inject, keyed by 1-based call ordinal over the store's lifetime.
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    refuse_connection: bool,
    session_failures: HashSet<u64>,
    query_failures: HashSet<u64>,
    query_panics: HashSet<u64>,
    latency: Duration,
}

impl FaultPlan {
    /// Make `open` fail.
    #[must_use]
    pub fn refuse_connection(mut self) -> Self {
        self.refuse_connection = true;
        self
    }

    /// Fail the `nth` session copy.
    #[must_use]
    pub fn fail_session(mut self, nth: u64) -> Self {
        self.session_failures.insert(nth);
        self
    }

    /// Fail the `nth` query.
    #[must_use]
    pub fn fail_query(mut self, nth: u64) -> Self {
        self.query_failures.insert(nth);
        self
    }

    /// Panic inside the `nth` query.
    #[must_use]
    pub fn panic_in_query(mut self, nth: u64) -> Self {
        self.query_panics.insert(nth);
        self
    }

    /// Delay every query by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[derive(Debug)]
struct Shared {
    collections: Collections,
    timeout: Duration,
    queries: AtomicU64,
    open_sessions: AtomicUsize,
}

/// Record store master handle backed by an in-memory document map.
#[derive(Debug)]
pub struct InMemoryRecordStore {
    shared: Arc<Shared>,
    plan: Arc<FaultPlan>,
    consistency: Consistency,
    copies: AtomicU64,
    closed: AtomicBool,
}

impl InMemoryRecordStore {
    /// Open the master handle.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if `config` is invalid.
    pub fn open(config: &StoreConfig, seed: Collections) -> Result<Self, StoreError> {
        Self::open_with_faults(config, seed, FaultPlan::default())
    }

    /// Open the master handle with a fault plan.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if `config` is invalid or the plan
    /// refuses the connection.
    pub fn open_with_faults(config: &StoreConfig, seed: Collections, plan: FaultPlan) -> Result<Self, StoreError> {
        info!(hosts = ?config.hosts, database = %config.database, "Opening record store");

        config.validate().map_err(StoreError::Connection)?;
        if plan.refuse_connection {
            return Err(StoreError::Connection(format!(
                "no reachable servers: {}",
                config.hosts.join(",")
            )));
        }

        let store = Self {
            shared: Arc::new(Shared {
                collections: seed,
                timeout: Duration::from_millis(config.operation_timeout_ms),
                queries: AtomicU64::new(0),
                open_sessions: AtomicUsize::new(0),
            }),
            plan: Arc::new(plan),
            consistency: config.consistency,
            copies: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        };

        info!(
            collections = store.shared.collections.len(),
            consistency = ?store.consistency,
            timeout_ms = config.operation_timeout_ms,
            "Record store opened"
        );
        Ok(store)
    }

    /// Replace the fault plan.
    #[must_use]
    pub fn with_faults(mut self, plan: FaultPlan) -> Self {
        self.plan = Arc::new(plan);
        self
    }

    /// Sessions copied and not yet released.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.shared.open_sessions.load(Ordering::Acquire)
    }

    /// Session copies attempted so far.
    #[must_use]
    pub fn sessions_copied(&self) -> u64 {
        self.copies.load(Ordering::Relaxed)
    }

    /// Queries started so far.
    #[must_use]
    pub fn queries_run(&self) -> u64 {
        self.shared.queries.load(Ordering::Relaxed)
    }

    /// Whether the master handle has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Consistency mode the handle was opened with.
    #[must_use]
    pub const fn consistency(&self) -> Consistency {
        self.consistency
    }
}

impl RecordStore for InMemoryRecordStore {
    type Session = InMemorySession;

    fn name(&self) -> &str {
        "memory"
    }

    fn copy_session(&self) -> Result<InMemorySession, StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        let ordinal = self.copies.fetch_add(1, Ordering::Relaxed) + 1;
        if self.plan.session_failures.contains(&ordinal) {
            return Err(StoreError::Session(format!("injected failure on copy #{ordinal}")));
        }

        self.shared.open_sessions.fetch_add(1, Ordering::AcqRel);
        debug!(session = ordinal, "Session copied");
        Ok(InMemorySession {
            id: ordinal,
            shared: Arc::clone(&self.shared),
            plan: Arc::clone(&self.plan),
        })
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let open = self.open_sessions();
        if open > 0 {
            warn!(open_sessions = open, "Closing record store with sessions still open");
        }
        info!("Record store closed");
    }
}

/// Session copied from an [`InMemoryRecordStore`]; released on drop.
#[derive(Debug)]
pub struct InMemorySession {
    id: u64,
    shared: Arc<Shared>,
    plan: Arc<FaultPlan>,
}

#[async_trait]
impl StoreSession for InMemorySession {
    async fn query(&self, collection: &str, sort_key: &str) -> Result<Vec<Record>, StoreError> {
        let ordinal = self.shared.queries.fetch_add(1, Ordering::Relaxed) + 1;

        if self.plan.query_panics.contains(&ordinal) {
            panic!("injected panic in query #{ordinal}");
        }

        if !self.plan.latency.is_zero() {
            let timeout = self.shared.timeout;
            if tokio::time::timeout(timeout, tokio::time::sleep(self.plan.latency)).await.is_err() {
                return Err(StoreError::Timeout(timeout));
            }
        }

        if self.plan.query_failures.contains(&ordinal) {
            return Err(StoreError::Query {
                collection: collection.to_string(),
                reason: format!("injected failure on query #{ordinal}"),
            });
        }

        let mut records = self
            .shared
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default();
        sort_records(&mut records, sort_key);
        Ok(records)
    }
}

impl Drop for InMemorySession {
    fn drop(&mut self) {
        self.shared.open_sessions.fetch_sub(1, Ordering::AcqRel);
        debug!(session = self.id, "Session closed");
    }
}
