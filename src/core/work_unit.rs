//! The unit of work each pool executor runs: sample pool saturation, read
//! one collection from the record store, signal completion.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use super::barrier::{CompletionBarrier, CompletionGuard};
use super::high_water::HighWaterMarks;
use super::store::{RecordStore, StoreSession};
use super::work_pool::{PoolGauges, PoolWorker};
use crate::util::fault::contain;

/// The read every unit performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    /// Collection to read in full.
    pub collection: String,
    /// Field the result is sorted on, ascending.
    pub sort_key: String,
}

impl QuerySpec {
    /// Create a query spec.
    pub fn new(collection: impl Into<String>, sort_key: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            sort_key: sort_key.into(),
        }
    }
}

/// How a unit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    /// The query returned this many records.
    Found(usize),
    /// No session could be copied from the master.
    SessionFailed,
    /// The query failed or timed out.
    QueryFailed,
    /// A panic was contained at the unit boundary.
    Faulted,
}

/// One submitted item. Holds shared handles only; the completion guard is
/// the one piece of state it owns, and it fires exactly once whether the
/// unit runs to the end, fails early, panics, or is dropped unrun.
pub struct WorkUnit<S: RecordStore> {
    tag: String,
    gauges: PoolGauges,
    marks: Arc<HighWaterMarks>,
    store: Arc<S>,
    query: Arc<QuerySpec>,
    completion: CompletionGuard,
}

impl<S: RecordStore> WorkUnit<S> {
    /// Bind a unit to the pool gauges, the shared high-water marks, the store
    /// and the caller's completion barrier.
    pub fn new(
        tag: impl Into<String>,
        gauges: PoolGauges,
        marks: Arc<HighWaterMarks>,
        store: Arc<S>,
        query: Arc<QuerySpec>,
        completion: Arc<CompletionBarrier>,
    ) -> Self {
        Self {
            tag: tag.into(),
            gauges,
            marks,
            store,
            query,
            completion: CompletionGuard::new(completion),
        }
    }

    /// Tag of the submitter.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Execute the unit on executor `worker_id` and report how it ended.
    /// The completion signal fires before this returns.
    pub async fn run(self, worker_id: usize) -> UnitOutcome {
        let Self {
            tag,
            gauges,
            marks,
            store,
            query,
            completion,
        } = self;
        let routine = format!("Rout_{worker_id:04}");

        let body = execute(&routine, &tag, &gauges, &marks, store.as_ref(), &query);
        let outcome = contain(&routine, "WorkUnit::run", body)
            .await
            .unwrap_or(UnitOutcome::Faulted);

        completion.fire();
        outcome
    }
}

#[async_trait]
impl<S: RecordStore> PoolWorker for WorkUnit<S> {
    async fn do_work(self, worker_id: usize) {
        self.run(worker_id).await;
    }
}

async fn execute<S: RecordStore>(
    routine: &str,
    tag: &str,
    gauges: &PoolGauges,
    marks: &HighWaterMarks,
    store: &S,
    query: &QuerySpec,
) -> UnitOutcome {
    let active = gauges.active_executors();
    let queued = gauges.queued_items();
    marks.record(active, queued);

    info!(routine, tag, queued, active, "Started");

    let session = match store.copy_session() {
        Ok(session) => session,
        Err(e) => {
            error!(routine, tag, store = store.name(), error = %e, "Completed : session unavailable");
            return UnitOutcome::SessionFailed;
        }
    };

    debug!(routine, collection = %query.collection, "Performing query");
    let result = session.query(&query.collection, &query.sort_key).await;
    debug!(routine, collection = %query.collection, "Query complete");
    drop(session);

    match result {
        Ok(records) => {
            info!(
                routine,
                tag,
                found = records.len(),
                queued = gauges.queued_items(),
                active = gauges.active_executors(),
                "Completed"
            );
            UnitOutcome::Found(records.len())
        }
        Err(e) => {
            error!(routine, tag, error = %e, "Completed : query failed");
            UnitOutcome::QueryFailed
        }
    }
}
