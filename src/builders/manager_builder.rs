//! Build a [`WorkManager`] over the in-memory record store from run settings.

use crate::config::{BenchConfig, StoreConfig};
use crate::core::{BenchError, WorkManager};
use crate::infra::store::{Collections, FaultPlan, InMemoryRecordStore};

/// Validate `cfg` and start a manager whose store is seeded with `seed`.
///
/// # Errors
///
/// - `BenchError::Config` if `cfg` fails validation
/// - any error from [`WorkManager::startup`]
pub fn build_manager(
    cfg: &BenchConfig,
    store_cfg: &StoreConfig,
    seed: Collections,
) -> Result<WorkManager<InMemoryRecordStore>, BenchError> {
    build_manager_with_faults(cfg, store_cfg, seed, FaultPlan::default())
}

/// Like [`build_manager`], with injected store faults.
///
/// # Errors
///
/// - `BenchError::Config` if `cfg` fails validation
/// - any error from [`WorkManager::startup`]
pub fn build_manager_with_faults(
    cfg: &BenchConfig,
    store_cfg: &StoreConfig,
    seed: Collections,
    faults: FaultPlan,
) -> Result<WorkManager<InMemoryRecordStore>, BenchError> {
    cfg.validate().map_err(BenchError::Config)?;
    WorkManager::startup(cfg.pool_config(), cfg.query_spec(), || {
        InMemoryRecordStore::open_with_faults(store_cfg, seed, faults)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::store::default_seed;

    #[test]
    fn test_build_from_defaults() {
        let mgr = build_manager(&BenchConfig::new(3), &StoreConfig::default(), default_seed()).unwrap();
        assert_eq!(mgr.worker_count(), 3);
        assert_eq!(mgr.queue_capacity(), 100);
        mgr.shutdown().unwrap();
    }

    #[test]
    fn test_invalid_run_config_rejected() {
        let mut cfg = BenchConfig::new(3);
        cfg.trials = 0;
        let result = build_manager(&cfg, &StoreConfig::default(), default_seed());
        assert!(matches!(result, Err(BenchError::Config(_))));
    }
}
