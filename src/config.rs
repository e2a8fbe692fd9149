//! Configuration management for Kebalance
//!
//! This module handles loading, validation, and management of the
//! configuration from YAML files. The operator-facing coordinator settings
//! (budget, strategy, priorities) live in [`CoordinatorConfig`] and are
//! also what gets persisted across restarts.

use crate::charger::ChargerId;
use crate::error::{KebalanceError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Lowest configurable total-current budget (A)
pub const MIN_TOTAL_BUDGET_A: u32 = 6;

/// Highest configurable total-current budget (A)
pub const MAX_TOTAL_BUDGET_A: u32 = 63;

/// Priority assumed for chargers without an explicit entry
pub const DEFAULT_PRIORITY: u32 = 999;

fn default_true() -> bool {
    true
}

/// Load-balancing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// No automatic changes; limits stay at their last manually set values
    #[default]
    Off,

    /// Split the budget evenly across actively charging chargers
    Equal,

    /// Fill chargers greedily in ascending priority order
    Priority,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Off => f.write_str("off"),
            Self::Equal => f.write_str("equal"),
            Self::Priority => f.write_str("priority"),
        }
    }
}

/// Operator-configured coordinator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Total current budget (A) shared across all active chargers
    pub total_budget_a: u32,

    /// Active load-balancing strategy
    pub strategy: Strategy,

    /// Per-charger priorities (positive, lower means higher priority)
    #[serde(default)]
    pub priorities: BTreeMap<ChargerId, u32>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            total_budget_a: 32,
            strategy: Strategy::Off,
            priorities: BTreeMap::new(),
        }
    }
}

impl CoordinatorConfig {
    /// Validate the coordinator settings
    pub fn validate(&self) -> Result<()> {
        if self.total_budget_a < MIN_TOTAL_BUDGET_A || self.total_budget_a > MAX_TOTAL_BUDGET_A {
            return Err(KebalanceError::validation(
                "total_budget_a".to_string(),
                format!(
                    "Must be between {} and {} A",
                    MIN_TOTAL_BUDGET_A, MAX_TOTAL_BUDGET_A
                ),
            ));
        }

        for (id, priority) in &self.priorities {
            if *priority == 0 {
                return Err(KebalanceError::validation(
                    format!("priorities.{}", id),
                    "Priority must be positive".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Priority for a charger, falling back to the default for unknown ids
    pub fn priority_for(&self, id: &ChargerId) -> u32 {
        self.priorities.get(id).copied().unwrap_or(DEFAULT_PRIORITY)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Path to log file (or directory for rotated files)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    #[serde(default = "default_true")]
    pub console_output: bool,

    /// Whether to use JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/kebalance.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Path of the JSON state file holding operator settings
    pub state_file: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            state_file: "/data/kebalance_state.json".to_string(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Coordinator settings (budget, strategy, priorities)
    pub coordinator: CoordinatorConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Persistence configuration
    pub persistence: PersistenceConfig,

    /// Polling interval of the external poller in milliseconds.
    /// The coordinator itself does not poll; this bounds how stale a
    /// snapshot may be and thus the recomputation latency.
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            coordinator: CoordinatorConfig::default(),
            logging: LoggingConfig::default(),
            persistence: PersistenceConfig::default(),
            poll_interval_ms: 10_000,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from default locations, falling back to defaults
    pub fn load() -> Result<Self> {
        let default_paths = [
            "kebalance_config.yaml",
            "/data/kebalance_config.yaml",
            "/etc/kebalance/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.coordinator.validate()?;

        if self.poll_interval_ms == 0 {
            return Err(KebalanceError::validation(
                "poll_interval_ms",
                "Must be greater than 0",
            ));
        }

        Ok(())
    }
}
