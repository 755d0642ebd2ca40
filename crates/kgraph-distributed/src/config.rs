//! Configuration for partitioning and federated execution.
//!
//! Values are resolved in three layers:
//! - Default values (embedded in binary)
//! - Configuration file (TOML format)
//! - Environment variable overrides (prefix: `KGRAPH__`)
//!
//! # Environment Variables
//!
//! - `KGRAPH__PARTITIONING__NUM_PARTITIONS=8`
//! - `KGRAPH__PARTITIONING__STRATEGY=round_robin`
//! - `KGRAPH__PARTITIONING__COPY_CROSS_EDGES=false`
//! - `KGRAPH__EXECUTION__MAX_WORKERS=2`
//! - `KGRAPH__EXECUTION__DEDUP=false`
//!
//! # Example
//!
//! ```ignore
//! use kgraph_distributed::config::FederationConfig;
//!
//! let config = FederationConfig::load(Some("kgraph.toml"))?;
//! let partitioner = GraphPartitioner::from_config(&config.partitioning)?;
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FederationConfig {
    /// How graphs are split into partitions
    pub partitioning: PartitioningConfig,
    /// How federated queries run
    pub execution: ExecutionConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl FederationConfig {
    /// Loads configuration from an optional file path with environment variable overrides.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (KGRAPH__*)
    /// 2. Configuration file (if provided)
    /// 3. Built-in defaults
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(file_path) = path {
            if Path::new(file_path).exists() {
                let contents = std::fs::read_to_string(file_path)?;
                config = toml::from_str(&contents)?;
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from an arbitrary lookup; unparsable values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("KGRAPH__PARTITIONING__NUM_PARTITIONS").and_then(|v| v.parse().ok()) {
            self.partitioning.num_partitions = v;
        }
        if let Some(val) = lookup("KGRAPH__PARTITIONING__STRATEGY") {
            self.partitioning.strategy = val;
        }
        if let Some(val) = lookup("KGRAPH__PARTITIONING__COPY_CROSS_EDGES") {
            self.partitioning.copy_cross_edges = parse_flag(&val);
        }

        if let Some(v) = lookup("KGRAPH__EXECUTION__MAX_WORKERS").and_then(|v| v.parse().ok()) {
            self.execution.max_workers = v;
        }
        if let Some(val) = lookup("KGRAPH__EXECUTION__DEDUP") {
            self.execution.dedup = parse_flag(&val);
        }

        if let Some(val) = lookup("KGRAPH__LOGGING__LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = lookup("KGRAPH__LOGGING__JSON") {
            self.logging.json = parse_flag(&val);
        }
    }

    /// Serializes the configuration to TOML format.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn parse_flag(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}

/// Partitioning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitioningConfig {
    /// Number of partitions (must be >= 1)
    pub num_partitions: usize,
    /// Strategy name: `hash`, `range` or `round_robin`
    pub strategy: String,
    /// Copy cross-partition relationships into the target's partition too
    pub copy_cross_edges: bool,
}

impl Default for PartitioningConfig {
    fn default() -> Self {
        Self {
            num_partitions: 4,
            strategy: "hash".to_string(),
            copy_cross_edges: true,
        }
    }
}

/// Federated execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Worker threads used by parallel execution
    pub max_workers: usize,
    /// Drop duplicate records while merging
    pub dedup: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            dedup: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Use JSON format for log output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
