//! Record store connection settings.

use serde::{Deserialize, Serialize};

/// Environment variable prefix for store settings.
pub const ENV_PREFIX: &str = "RECORD_STORE_";

/// Read/write consistency mode requested from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Consistency {
    /// All reads and writes go to the primary over one connection.
    #[default]
    Strong,
    /// Reads may be served by secondaries.
    Eventual,
}

/// Connection settings used once to open the master store handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Host addresses (`host:port`).
    pub hosts: Vec<String>,
    /// Database name.
    pub database: String,
    /// Optional username.
    #[serde(default)]
    pub username: Option<String>,
    /// Optional password.
    #[serde(default)]
    pub password: Option<String>,
    /// Per-operation timeout in milliseconds.
    pub operation_timeout_ms: u64,
    /// Consistency mode.
    #[serde(default)]
    pub consistency: Consistency,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["localhost:27017".into()],
            database: "goinggo".into(),
            username: None,
            password: None,
            operation_timeout_ms: 10_000,
            consistency: Consistency::Strong,
        }
    }
}

impl StoreConfig {
    /// Validate store settings.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.hosts.is_empty() || self.hosts.iter().any(|h| h.trim().is_empty()) {
            return Err("at least one non-empty host is required".into());
        }
        if self.database.trim().is_empty() {
            return Err("database must not be empty".into());
        }
        if self.operation_timeout_ms == 0 {
            return Err("operation_timeout_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Load settings from the process environment, after reading `.env` if present.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or validation fails.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from a variable lookup, starting from the defaults.
    ///
    /// Recognised keys: `RECORD_STORE_HOSTS` (comma separated),
    /// `RECORD_STORE_DATABASE`, `RECORD_STORE_USERNAME`,
    /// `RECORD_STORE_PASSWORD`, `RECORD_STORE_TIMEOUT_MS` and
    /// `RECORD_STORE_CONSISTENCY` (`strong` or `eventual`).
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or validation fails.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let mut cfg = Self::default();

        if let Some(hosts) = var("HOSTS") {
            cfg.hosts = hosts.split(',').map(|h| h.trim().to_string()).collect();
        }
        if let Some(database) = var("DATABASE") {
            cfg.database = database;
        }
        cfg.username = var("USERNAME").or(cfg.username);
        cfg.password = var("PASSWORD").or(cfg.password);
        if let Some(timeout) = var("TIMEOUT_MS") {
            cfg.operation_timeout_ms = timeout
                .parse()
                .map_err(|e| format!("{ENV_PREFIX}TIMEOUT_MS: {e}"))?;
        }
        if let Some(mode) = var("CONSISTENCY") {
            cfg.consistency = match mode.to_ascii_lowercase().as_str() {
                "strong" => Consistency::Strong,
                "eventual" => Consistency::Eventual,
                other => return Err(format!("{ENV_PREFIX}CONSISTENCY: unknown mode `{other}`")),
            };
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_empty() {
        let cfg = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, StoreConfig::default());
        assert_eq!(cfg.consistency, Consistency::Strong);
    }

    #[test]
    fn test_environment_overrides() {
        let cfg = StoreConfig::from_lookup(lookup(&[
            ("RECORD_STORE_HOSTS", "a:1, b:2"),
            ("RECORD_STORE_DATABASE", "buoys"),
            ("RECORD_STORE_USERNAME", "guest"),
            ("RECORD_STORE_TIMEOUT_MS", "250"),
            ("RECORD_STORE_CONSISTENCY", "Eventual"),
        ]))
        .unwrap();
        assert_eq!(cfg.hosts, vec!["a:1".to_string(), "b:2".to_string()]);
        assert_eq!(cfg.database, "buoys");
        assert_eq!(cfg.username.as_deref(), Some("guest"));
        assert_eq!(cfg.operation_timeout_ms, 250);
        assert_eq!(cfg.consistency, Consistency::Eventual);
    }

    #[test]
    fn test_bad_timeout_rejected() {
        let err = StoreConfig::from_lookup(lookup(&[("RECORD_STORE_TIMEOUT_MS", "soon")])).unwrap_err();
        assert!(err.starts_with("RECORD_STORE_TIMEOUT_MS"));
    }

    #[test]
    fn test_zero_timeout_invalid() {
        let cfg = StoreConfig {
            operation_timeout_ms: 0,
            ..StoreConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
