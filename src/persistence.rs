//! Persistence for operator-set coordinator configuration
//!
//! The coordinator core delegates storage to its host; this module is the
//! default file-backed implementation used by the bundled binary. It keeps
//! the budget, strategy, and priority map in a small JSON state file so
//! operator settings survive restarts.

use crate::config::CoordinatorConfig;
use crate::error::Result;
use crate::logging::get_logger;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persistent state structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistentState {
    /// Operator-set coordinator configuration
    pub coordinator: CoordinatorConfig,

    /// When the state was last written
    pub saved_at: DateTime<Utc>,
}

impl Default for PersistentState {
    fn default() -> Self {
        Self {
            coordinator: CoordinatorConfig::default(),
            saved_at: Utc::now(),
        }
    }
}

/// Persistence manager
pub struct PersistenceManager {
    file_path: PathBuf,
    state: PersistentState,
    logger: crate::logging::StructuredLogger,
}

impl PersistenceManager {
    /// Create a new persistence manager
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            state: PersistentState::default(),
            logger: get_logger("persistence"),
        }
    }

    /// Load state from disk. A missing file is not an error; defaults apply.
    pub fn load(&mut self) -> Result<()> {
        if !self.file_path.exists() {
            self.logger
                .info("No persistent state file found, using defaults");
            return Ok(());
        }

        let contents = std::fs::read_to_string(&self.file_path)?;
        self.state = serde_json::from_str(&contents)?;
        self.logger.info("Loaded persistent state from disk");

        Ok(())
    }

    /// Save state to disk
    pub fn save(&mut self) -> Result<()> {
        self.state.saved_at = Utc::now();
        let contents = serde_json::to_string_pretty(&self.state)?;
        std::fs::write(&self.file_path, contents)?;
        self.logger.debug("Saved persistent state to disk");

        Ok(())
    }

    /// The stored coordinator configuration
    pub fn coordinator_config(&self) -> &CoordinatorConfig {
        &self.state.coordinator
    }

    /// Replace the stored coordinator configuration (call `save` to flush)
    pub fn set_coordinator_config(&mut self, config: CoordinatorConfig) {
        self.state.coordinator = config;
    }
}
