//! Runner configuration, loaded from TOML.
//!
//! ```toml
//! machine_name = "door"
//! tags = ["warehouse"]
//! branch_tracking = true
//! verbose = false
//! log_filter = "swarm_runner=debug"
//! subscription = ["partReq", "partOK", "closingTime"]
//! ```
//!
//! Every field is optional.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use swarm_interchange::EventType;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to parse config: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Name used in log output; the protocol's machine name when empty.
    pub machine_name: String,
    /// Tags the runner publishes with and subscribes to.
    pub tags: Vec<String>,
    pub branch_tracking: bool,
    /// Log every state change at `info` instead of `debug`.
    pub verbose: bool,
    /// `tracing` filter directive for [`init_tracing`](crate::init_tracing).
    pub log_filter: String,
    /// Event types to receive; every type when absent.
    pub subscription: Option<BTreeSet<EventType>>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            machine_name: String::new(),
            tags: Vec::new(),
            branch_tracking: false,
            verbose: false,
            log_filter: "info".to_string(),
            subscription: None,
        }
    }
}

impl RunnerConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = RunnerConfig::from_toml_str("").unwrap();
        assert_eq!(config, RunnerConfig::default());
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_full_config() {
        let config = RunnerConfig::from_toml_str(
            r#"
            machine_name = "door"
            tags = ["warehouse"]
            branch_tracking = true
            verbose = true
            log_filter = "debug"
            subscription = ["partReq", "closingTime"]
            "#,
        )
        .unwrap();
        assert_eq!(config.machine_name, "door");
        assert!(config.branch_tracking);
        assert!(config.verbose);
        let subscription = config.subscription.unwrap();
        assert!(subscription.contains("partReq"));
        assert_eq!(subscription.len(), 2);
    }

    #[test]
    fn test_bad_config_is_a_parse_error() {
        match RunnerConfig::from_toml_str("branch_tracking = \"yes\"") {
            Err(ConfigError::Parse(_)) => {}
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        match RunnerConfig::from_path("/nonexistent/runner.toml") {
            Err(ConfigError::Io { path, .. }) => assert!(path.ends_with("runner.toml")),
            other => panic!("expected Io error, got {:?}", other),
        }
    }
}
