//! Charger registry
//!
//! Tracks the live set of registered chargers and their latest observed
//! state. All mutation happens through the coordinator's mutex; the
//! registry itself is a plain map so snapshots are always consistent.

use crate::charger::{ChargerHandle, ChargerId, StateSnapshot};
use crate::error::{KebalanceError, Result};
use crate::logging::get_logger;
use std::collections::BTreeMap;

/// Live set of registered chargers
pub struct ChargerRegistry {
    chargers: BTreeMap<ChargerId, ChargerHandle>,
    logger: crate::logging::StructuredLogger,
}

impl Default for ChargerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChargerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            chargers: BTreeMap::new(),
            logger: get_logger("registry"),
        }
    }

    /// Register a new charger
    pub fn register(&mut self, handle: ChargerHandle) -> Result<()> {
        if self.chargers.contains_key(&handle.id) {
            return Err(KebalanceError::duplicate_charger(handle.id.as_str()));
        }
        self.logger.info(&format!(
            "Registered charger {} (priority {})",
            handle.id, handle.priority
        ));
        self.chargers.insert(handle.id.clone(), handle);
        Ok(())
    }

    /// Remove a charger, returning its handle
    pub fn deregister(&mut self, id: &ChargerId) -> Result<ChargerHandle> {
        let handle = self
            .chargers
            .remove(id)
            .ok_or_else(|| KebalanceError::unknown_charger(id.as_str()))?;
        self.logger
            .info(&format!("Deregistered charger {}", handle.id));
        Ok(handle)
    }

    /// Apply a freshly polled snapshot.
    ///
    /// Returns whether the charging-active flag transitioned, which is what
    /// drives allocation recomputation.
    pub fn update_state(&mut self, id: &ChargerId, snapshot: StateSnapshot) -> Result<bool> {
        let handle = self
            .chargers
            .get_mut(id)
            .ok_or_else(|| KebalanceError::unknown_charger(id.as_str()))?;

        let was_charging = handle.is_charging();
        handle.apply_snapshot(snapshot);
        let is_charging = handle.is_charging();

        if was_charging != is_charging {
            self.logger.debug(&format!(
                "Charger {} charging-active {} -> {}",
                id, was_charging, is_charging
            ));
        }
        Ok(was_charging != is_charging)
    }

    /// Record the commanded-limit bookkeeping for a charger.
    ///
    /// Silently ignores unknown ids: a charger may be deregistered while a
    /// command for it is still in flight.
    pub fn set_commanded_limit(&mut self, id: &ChargerId, amps: Option<u32>) {
        if let Some(handle) = self.chargers.get_mut(id) {
            handle.commanded_limit_a = amps;
        }
    }

    /// Consistent point-in-time copy of all handles for an allocation pass
    pub fn snapshot_all(&self) -> Vec<ChargerHandle> {
        self.chargers.values().cloned().collect()
    }

    /// Get a handle by id
    pub fn get(&self, id: &ChargerId) -> Option<&ChargerHandle> {
        self.chargers.get(id)
    }

    /// Get a mutable handle by id
    pub fn get_mut(&mut self, id: &ChargerId) -> Option<&mut ChargerHandle> {
        self.chargers.get_mut(id)
    }

    /// Whether a charger is registered
    pub fn contains(&self, id: &ChargerId) -> bool {
        self.chargers.contains_key(id)
    }

    /// Number of registered chargers
    pub fn len(&self) -> usize {
        self.chargers.len()
    }

    /// Whether no chargers are registered
    pub fn is_empty(&self) -> bool {
        self.chargers.is_empty()
    }
}
