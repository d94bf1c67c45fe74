//! Server configuration.
//!
//! # Load order
//!
//! 1. Built-in defaults
//! 2. TOML file, when one is given and exists
//! 3. `GRIDLAB_*` environment variables
//!
//! Each layer overrides the previous one.

use std::path::{Path, PathBuf};
use std::time::Duration;

use gridlab_db::DbConfig;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_LOG_FILTER: &str = "gridlab=info";

/// Longest accepted ping or sweep interval: one day.
pub const MAX_INTERVAL_SECS: u64 = 86_400;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for environment variable '{name}': {message}")]
    InvalidEnvVar { name: String, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    fn invalid_env_var(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub database: DbConfig,
    pub bus: BusConfig,
    pub reconcile: ReconcileConfig,
    /// `tracing` filter directive. `RUST_LOG` takes precedence.
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database: DbConfig::default(),
            bus: BusConfig::default(),
            reconcile: ReconcileConfig::default(),
            log_filter: DEFAULT_LOG_FILTER.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Exchange shared by component status reports and actions.
    pub exchange: String,
    /// Queue this backend consumes status reports from.
    pub queue: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            exchange: "villas".into(),
            queue: "gridlab-status".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub ping_interval_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: 30,
            sweep_interval_secs: 300,
        }
    }
}

impl ReconcileConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl ServerConfig {
    /// Load defaults, then `path`, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?.unwrap_or_default(),
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// `None` when the file does not exist.
    fn from_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), "Loaded config file");
        Ok(Some(config))
    }

    /// Override settings from variables found by `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let strings = [
            ("GRIDLAB_DB_URL", &mut self.database.url),
            ("GRIDLAB_DB_NAMESPACE", &mut self.database.namespace),
            ("GRIDLAB_DB_DATABASE", &mut self.database.database),
            ("GRIDLAB_DB_USERNAME", &mut self.database.username),
            ("GRIDLAB_DB_PASSWORD", &mut self.database.password),
            ("GRIDLAB_BUS_EXCHANGE", &mut self.bus.exchange),
            ("GRIDLAB_BUS_QUEUE", &mut self.bus.queue),
            ("GRIDLAB_LOG", &mut self.log_filter),
        ];
        for (name, field) in strings {
            if let Some(value) = lookup(name) {
                *field = value;
            }
        }

        let seconds = [
            (
                "GRIDLAB_PING_INTERVAL_SECS",
                &mut self.reconcile.ping_interval_secs,
            ),
            (
                "GRIDLAB_SWEEP_INTERVAL_SECS",
                &mut self.reconcile.sweep_interval_secs,
            ),
        ];
        for (name, field) in seconds {
            if let Some(value) = lookup(name) {
                *field = value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::invalid_env_var(name, "expected whole seconds"))?;
            }
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reconcile.ping_interval_secs == 0 || self.reconcile.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "reconcile intervals must be at least one second".into(),
            ));
        }
        if self.reconcile.ping_interval_secs > MAX_INTERVAL_SECS
            || self.reconcile.sweep_interval_secs > MAX_INTERVAL_SECS
        {
            return Err(ConfigError::Invalid(format!(
                "reconcile intervals must not exceed {MAX_INTERVAL_SECS} seconds"
            )));
        }
        if self.bus.exchange.is_empty() || self.bus.queue.is_empty() {
            return Err(ConfigError::Invalid(
                "bus exchange and queue must be set".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert_eq!(config.reconcile.ping_interval(), Duration::from_secs(30));
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = ServerConfig::from_toml(
            r#"
log_filter = "gridlab=debug"

[database]
url = "db.internal:8000"

[reconcile]
sweep_interval_secs = 60
"#,
        )
        .unwrap();

        assert_eq!(config.log_filter, "gridlab=debug");
        assert_eq!(config.database.url, "db.internal:8000");
        assert_eq!(config.database.namespace, "gridlab");
        assert_eq!(config.reconcile.sweep_interval_secs, 60);
        assert_eq!(config.reconcile.ping_interval_secs, 30);
        assert_eq!(config.bus.exchange, "villas");
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = ServerConfig::from_toml("[bus]\nqueue = \"from-file\"\n").unwrap();
        config
            .apply_env(env(&[
                ("GRIDLAB_BUS_QUEUE", "from-env"),
                ("GRIDLAB_PING_INTERVAL_SECS", "5"),
                ("GRIDLAB_DB_PASSWORD", "secret"),
            ]))
            .unwrap();

        assert_eq!(config.bus.queue, "from-env");
        assert_eq!(config.reconcile.ping_interval_secs, 5);
        assert_eq!(config.database.password, "secret");
    }

    #[test]
    fn bad_interval_env_is_rejected() {
        let mut config = ServerConfig::default();
        let err = config
            .apply_env(env(&[("GRIDLAB_SWEEP_INTERVAL_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("GRIDLAB_SWEEP_INTERVAL_SECS"));
    }

    #[test]
    fn zero_interval_is_invalid() {
        let mut config = ServerConfig::default();
        config.reconcile.ping_interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn intervals_are_capped_at_one_day() {
        let mut config = ServerConfig::default();
        config.reconcile.sweep_interval_secs = MAX_INTERVAL_SECS;
        config.validate().unwrap();

        config.reconcile.sweep_interval_secs = u64::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ServerConfig::default();
        config
            .apply_env(env(&[("GRIDLAB_PING_INTERVAL_SECS", "86401")]))
            .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ServerConfig::from_file(&dir.path().join("absent.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn malformed_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gridlab.toml");
        std::fs::write(&path, "[reconcile]\nping_interval_secs = \"often\"\n").unwrap();

        let err = ServerConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
        assert!(err.to_string().contains("gridlab.toml"));
    }
}
