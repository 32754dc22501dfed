//! Benchmark run configuration.

use serde::{Deserialize, Serialize};

use super::PoolConfig;
use crate::core::QuerySpec;

/// Settings for one benchmark run: pool shape, burst size, trial count and
/// the query each unit performs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Number of pool executors.
    pub routines: usize,
    /// Units submitted per trial.
    #[serde(default = "default_amount_of_work")]
    pub amount_of_work: usize,
    /// Backlog capacity; defaults to `amount_of_work`.
    #[serde(default)]
    pub queue_capacity: Option<usize>,
    /// Number of timed trials.
    #[serde(default = "default_trials")]
    pub trials: usize,
    /// Collection each unit reads.
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Ascending sort key for the read.
    #[serde(default = "default_sort_key")]
    pub sort_key: String,
    /// Whether per-unit logging is enabled.
    #[serde(default)]
    pub logging: bool,
}

const fn default_amount_of_work() -> usize {
    100
}

const fn default_trials() -> usize {
    5
}

fn default_collection() -> String {
    "buoy_stations".into()
}

fn default_sort_key() -> String {
    "station_id".into()
}

impl BenchConfig {
    /// Defaults for everything but the executor count.
    #[must_use]
    pub fn new(routines: usize) -> Self {
        Self {
            routines,
            amount_of_work: default_amount_of_work(),
            queue_capacity: None,
            trials: default_trials(),
            collection: default_collection(),
            sort_key: default_sort_key(),
            logging: false,
        }
    }

    /// Backlog capacity actually used.
    #[must_use]
    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(self.amount_of_work)
    }

    /// Pool configuration derived from this run.
    #[must_use]
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new()
            .with_worker_count(self.routines)
            .with_queue_capacity(self.effective_queue_capacity())
    }

    /// Query each unit performs.
    #[must_use]
    pub fn query_spec(&self) -> QuerySpec {
        QuerySpec::new(self.collection.clone(), self.sort_key.clone())
    }

    /// Validate run settings.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        self.pool_config().validate()?;
        if self.trials == 0 {
            return Err("trials must be greater than 0".into());
        }
        if self.collection.trim().is_empty() {
            return Err("collection must not be empty".into());
        }
        if self.sort_key.trim().is_empty() {
            return Err("sort_key must not be empty".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON or failed validation.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Command-line values layered over a [`BenchConfig`].
///
/// `None` keeps whatever the base configuration holds. The logging switch
/// can only turn logging on; a file that enables it stays enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BenchOverrides {
    /// Executor count.
    pub routines: Option<usize>,
    /// Units per trial.
    pub amount_of_work: Option<usize>,
    /// Number of trials.
    pub trials: Option<usize>,
    /// Backlog capacity.
    pub queue_capacity: Option<usize>,
    /// Logging switch.
    pub logging: bool,
}

impl BenchOverrides {
    /// Apply the overrides to `base` and validate the result.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn apply(&self, mut base: BenchConfig) -> Result<BenchConfig, String> {
        if let Some(routines) = self.routines {
            base.routines = routines;
        }
        if let Some(amount_of_work) = self.amount_of_work {
            base.amount_of_work = amount_of_work;
        }
        if let Some(trials) = self.trials {
            base.trials = trials;
        }
        if self.queue_capacity.is_some() {
            base.queue_capacity = self.queue_capacity;
        }
        base.logging |= self.logging;
        base.validate()?;
        Ok(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_run_shape() {
        let cfg = BenchConfig::new(24);
        assert_eq!(cfg.amount_of_work, 100);
        assert_eq!(cfg.trials, 5);
        assert_eq!(cfg.effective_queue_capacity(), 100);
        assert_eq!(cfg.collection, "buoy_stations");
        assert_eq!(cfg.sort_key, "station_id");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_queue_capacity_override() {
        let mut cfg = BenchConfig::new(4);
        cfg.queue_capacity = Some(50);
        let pool = cfg.pool_config();
        assert_eq!(pool.worker_count, 4);
        assert_eq!(pool.queue_capacity, 50);
    }

    #[test]
    fn test_zero_routines_rejected() {
        assert!(BenchConfig::new(0).validate().is_err());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let cfg = BenchConfig::from_json_str(r#"{"routines": 8, "trials": 3}"#).unwrap();
        assert_eq!(cfg.routines, 8);
        assert_eq!(cfg.trials, 3);
        assert_eq!(cfg.amount_of_work, 100);
    }

    #[test]
    fn test_from_json_rejects_zero_trials() {
        let err = BenchConfig::from_json_str(r#"{"routines": 8, "trials": 0}"#).unwrap_err();
        assert_eq!(err, "trials must be greater than 0");
    }

    #[test]
    fn test_overrides_keep_file_values_when_unset() {
        let base = BenchConfig::from_json_str(r#"{"routines": 8, "amount_of_work": 7, "trials": 2, "logging": true}"#)
            .unwrap();
        let overrides = BenchOverrides {
            routines: Some(2),
            ..BenchOverrides::default()
        };
        let cfg = overrides.apply(base).unwrap();
        assert_eq!(cfg.routines, 2);
        assert_eq!(cfg.amount_of_work, 7);
        assert_eq!(cfg.trials, 2);
        assert!(cfg.logging);
    }

    #[test]
    fn test_overrides_replace_set_values() {
        let overrides = BenchOverrides {
            routines: Some(4),
            amount_of_work: Some(40),
            trials: Some(3),
            queue_capacity: Some(10),
            logging: true,
        };
        let cfg = overrides.apply(BenchConfig::new(1)).unwrap();
        assert_eq!(cfg.routines, 4);
        assert_eq!(cfg.amount_of_work, 40);
        assert_eq!(cfg.trials, 3);
        assert_eq!(cfg.effective_queue_capacity(), 10);
        assert!(cfg.logging);
    }

    #[test]
    fn test_overrides_validate_result() {
        let overrides = BenchOverrides {
            trials: Some(0),
            ..BenchOverrides::default()
        };
        assert!(overrides.apply(BenchConfig::new(2)).is_err());
    }
}
