//! Allocation engine
//!
//! Given a consistent registry snapshot and the coordinator configuration,
//! compute the new per-charger current limits. Planning is a pure function;
//! command dispatch is the coordinator's concern.
//!
//! Off leaves limits untouched. Equal splits the budget evenly across the
//! charging-active set. Priority walks the active set in ascending priority
//! order (ties broken by charger id) and greedily funds each charger. In
//! both automatic strategies no charger is ever commanded below the 6 A
//! protocol floor, even when that makes the total exceed the configured
//! budget; the overshoot is logged as a warning.

use crate::aggregate::{self, Aggregates};
use crate::charger::{ChargerHandle, ChargerId, MIN_CHARGER_CURRENT_A};
use crate::config::{CoordinatorConfig, Strategy};
use crate::logging::get_logger;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Outcome of one allocation pass. Transient; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationResult {
    /// Unique id of this pass, for log correlation
    pub pass_id: Uuid,

    /// When the pass was computed
    pub computed_at: DateTime<Utc>,

    /// Newly assigned limits (A) for charging-active chargers.
    /// Chargers absent from the map keep their current limit.
    pub limits: BTreeMap<ChargerId, u32>,

    /// Aggregates derived from the same snapshot
    pub aggregates: Aggregates,
}

/// Plan new current limits for one registry snapshot
pub fn plan(snapshot: &[ChargerHandle], config: &CoordinatorConfig) -> AllocationResult {
    let aggregates = aggregate::compute(snapshot, config);

    let limits = match config.strategy {
        Strategy::Off => BTreeMap::new(),
        Strategy::Equal => equal_shares(snapshot, config),
        Strategy::Priority => priority_shares(snapshot, config),
    };

    AllocationResult {
        pass_id: Uuid::new_v4(),
        computed_at: Utc::now(),
        limits,
        aggregates,
    }
}

/// Split the budget evenly across the charging-active set
fn equal_shares(snapshot: &[ChargerHandle], config: &CoordinatorConfig) -> BTreeMap<ChargerId, u32> {
    let logger = get_logger("allocation");
    let active: Vec<&ChargerHandle> = snapshot.iter().filter(|h| h.is_charging()).collect();
    if active.is_empty() {
        return BTreeMap::new();
    }

    let share = config.total_budget_a / active.len() as u32;
    if share < MIN_CHARGER_CURRENT_A {
        logger.warn(&format!(
            "Budget {} A cannot fund {} active chargers at the {} A minimum; \
             pinning all to the protocol floor (total will exceed the budget)",
            config.total_budget_a,
            active.len(),
            MIN_CHARGER_CURRENT_A
        ));
    }

    active
        .iter()
        .map(|handle| {
            let amps = share.clamp(MIN_CHARGER_CURRENT_A, handle.ceiling_a());
            (handle.id.clone(), amps)
        })
        .collect()
}

/// Fund chargers greedily in ascending priority order, ties by id
fn priority_shares(
    snapshot: &[ChargerHandle],
    config: &CoordinatorConfig,
) -> BTreeMap<ChargerId, u32> {
    let logger = get_logger("allocation");
    let mut active: Vec<&ChargerHandle> = snapshot.iter().filter(|h| h.is_charging()).collect();
    if active.is_empty() {
        return BTreeMap::new();
    }
    active.sort_by(|a, b| (a.priority, &a.id).cmp(&(b.priority, &b.id)));

    let mut limits = BTreeMap::new();
    let mut remaining = config.total_budget_a;
    for handle in active {
        // Unfunded chargers still get the protocol floor; the device cannot
        // be commanded below it while charging is enabled.
        let amps = remaining.min(handle.ceiling_a()).max(MIN_CHARGER_CURRENT_A);
        remaining = remaining.saturating_sub(amps);
        limits.insert(handle.id.clone(), amps);
    }

    let total: u32 = limits.values().sum();
    if total > config.total_budget_a {
        logger.warn(&format!(
            "Priority allocation totals {} A against a {} A budget; \
             {} unfunded charger(s) pinned to the protocol floor",
            total,
            config.total_budget_a,
            limits
                .values()
                .filter(|a| **a == MIN_CHARGER_CURRENT_A)
                .count()
        ));
    }

    limits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charger::{ChargerState, PlugStatus, StateSnapshot};

    fn charging(id: &str, priority: u32) -> ChargerHandle {
        let mut handle = ChargerHandle::new(ChargerId::new(id), priority);
        handle.apply_snapshot(StateSnapshot::new(
            ChargerState::Charging,
            PlugStatus::PluggedOnStationAndEvLocked,
        ));
        handle
    }

    fn idle(id: &str, priority: u32) -> ChargerHandle {
        ChargerHandle::new(ChargerId::new(id), priority)
    }

    fn config(budget: u32, strategy: Strategy) -> CoordinatorConfig {
        CoordinatorConfig {
            total_budget_a: budget,
            strategy,
            ..Default::default()
        }
    }

    #[test]
    fn test_equal_two_chargers_split_budget() {
        let snapshot = vec![charging("a", 1), charging("b", 2)];
        let result = plan(&snapshot, &config(32, Strategy::Equal));
        assert_eq!(result.limits[&ChargerId::new("a")], 16);
        assert_eq!(result.limits[&ChargerId::new("b")], 16);
    }

    #[test]
    fn test_equal_floor_division_stays_within_budget() {
        // floor(20/3) = 6, total 18 <= 20
        let snapshot = vec![charging("a", 1), charging("b", 2), charging("c", 3)];
        let result = plan(&snapshot, &config(20, Strategy::Equal));
        for amps in result.limits.values() {
            assert_eq!(*amps, 6);
        }
        assert_eq!(result.limits.values().sum::<u32>(), 18);
    }

    #[test]
    fn test_equal_pins_to_floor_when_underfunded() {
        // floor(10/2) = 5 < 6: both get the protocol floor, overshooting
        let snapshot = vec![charging("a", 1), charging("b", 2)];
        let result = plan(&snapshot, &config(10, Strategy::Equal));
        assert_eq!(result.limits[&ChargerId::new("a")], 6);
        assert_eq!(result.limits[&ChargerId::new("b")], 6);
    }

    #[test]
    fn test_equal_respects_device_ceiling() {
        let mut capped = charging("a", 1);
        let mut snap = StateSnapshot::new(
            ChargerState::Charging,
            PlugStatus::PluggedOnStationAndEvLocked,
        );
        snap.max_current_hw_a = Some(10);
        capped.apply_snapshot(snap);

        let snapshot = vec![capped, charging("b", 2)];
        let result = plan(&snapshot, &config(32, Strategy::Equal));
        assert_eq!(result.limits[&ChargerId::new("a")], 10);
        assert_eq!(result.limits[&ChargerId::new("b")], 16);
    }

    #[test]
    fn test_equal_ignores_idle_chargers() {
        let snapshot = vec![charging("a", 1), idle("b", 2)];
        let result = plan(&snapshot, &config(32, Strategy::Equal));
        assert_eq!(result.limits.len(), 1);
        assert_eq!(result.limits[&ChargerId::new("a")], 32);
    }

    #[test]
    fn test_equal_no_actives_no_allocation() {
        let snapshot = vec![idle("a", 1), idle("b", 2)];
        let result = plan(&snapshot, &config(32, Strategy::Equal));
        assert!(result.limits.is_empty());
        assert_eq!(result.aggregates.active_chargers, 0);
    }

    #[test]
    fn test_priority_greedy_with_floor_overshoot() {
        // Budget 10: priority 1 takes min(32, 10) = 10, priority 2 is
        // unfunded but still gets the 6 A floor.
        let snapshot = vec![charging("a", 1), charging("b", 2)];
        let result = plan(&snapshot, &config(10, Strategy::Priority));
        assert_eq!(result.limits[&ChargerId::new("a")], 10);
        assert_eq!(result.limits[&ChargerId::new("b")], 6);
    }

    #[test]
    fn test_priority_caps_at_device_maximum() {
        let snapshot = vec![charging("a", 1), charging("b", 2)];
        let result = plan(&snapshot, &config(63, Strategy::Priority));
        assert_eq!(result.limits[&ChargerId::new("a")], 32);
        assert_eq!(result.limits[&ChargerId::new("b")], 31);
        assert_eq!(result.limits.values().sum::<u32>(), 63);
    }

    #[test]
    fn test_priority_ties_break_by_id() {
        let snapshot = vec![charging("b", 1), charging("a", 1)];
        let result = plan(&snapshot, &config(38, Strategy::Priority));
        // Same priority: "a" sorts first and is funded first
        assert_eq!(result.limits[&ChargerId::new("a")], 32);
        assert_eq!(result.limits[&ChargerId::new("b")], 6);
    }

    #[test]
    fn test_priority_is_idempotent() {
        let snapshot = vec![charging("a", 2), charging("b", 1), charging("c", 3)];
        let cfg = config(40, Strategy::Priority);
        let first = plan(&snapshot, &cfg);
        let second = plan(&snapshot, &cfg);
        assert_eq!(first.limits, second.limits);
        assert_eq!(first.aggregates, second.aggregates);
    }

    #[test]
    fn test_off_plans_nothing_but_aggregates() {
        let snapshot = vec![charging("a", 1), charging("b", 2)];
        let result = plan(&snapshot, &config(32, Strategy::Off));
        assert!(result.limits.is_empty());
        assert_eq!(result.aggregates.active_chargers, 2);
        assert_eq!(result.aggregates.distribution, "Off - No load balancing");
    }
}
