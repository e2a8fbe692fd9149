//! Aggregated metrics over a registry snapshot
//!
//! Pure functions computing the read-only values the host pushes into its
//! sensor surfaces: total power, session and lifetime energy, active-charger
//! count, and a human-readable distribution summary.

use crate::charger::{ChargerHandle, ChargerId, ChargerState, PlugStatus};
use crate::config::{CoordinatorConfig, Strategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-charger slice of the aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargerStatus {
    /// Reported charging state
    pub state: ChargerState,

    /// Reported plug status
    pub plug: PlugStatus,

    /// Active power (W)
    pub power_w: f64,

    /// Last confirmed current limit (A), if any
    pub commanded_limit_a: Option<u32>,

    /// Assigned priority
    pub priority: u32,
}

/// Aggregated read-only metrics for the whole charger pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    /// Sum of active power across all chargers (W)
    pub total_power_w: f64,

    /// Sum of current-session energy across all chargers (kWh)
    pub total_session_energy_kwh: f64,

    /// Sum of lifetime energy counters (kWh)
    pub total_energy_kwh: f64,

    /// Number of chargers with charging-active = true
    pub active_chargers: usize,

    /// Human-readable distribution summary
    pub distribution: String,

    /// Whether load balancing is currently in effect
    pub load_balancing_active: bool,

    /// Per-charger status map for host sensor surfaces
    pub charger_states: BTreeMap<ChargerId, ChargerStatus>,
}

/// Compute aggregates from a registry snapshot. Pure; no side effects.
pub fn compute(snapshot: &[ChargerHandle], config: &CoordinatorConfig) -> Aggregates {
    let mut total_power_w = 0.0;
    let mut total_session_energy_kwh = 0.0;
    let mut total_energy_kwh = 0.0;
    let mut active_chargers = 0;
    let mut charger_states = BTreeMap::new();

    for handle in snapshot {
        total_power_w += handle.snapshot.power_w;
        total_session_energy_kwh += handle.snapshot.session_energy_kwh;
        total_energy_kwh += handle.snapshot.total_energy_kwh;
        if handle.is_charging() {
            active_chargers += 1;
        }

        charger_states.insert(
            handle.id.clone(),
            ChargerStatus {
                state: handle.snapshot.state,
                plug: handle.snapshot.plug,
                power_w: handle.snapshot.power_w,
                commanded_limit_a: handle.commanded_limit_a,
                priority: handle.priority,
            },
        );
    }

    Aggregates {
        total_power_w,
        total_session_energy_kwh,
        total_energy_kwh,
        active_chargers,
        distribution: describe_distribution(config, active_chargers),
        load_balancing_active: config.strategy != Strategy::Off && active_chargers >= 2,
        charger_states,
    }
}

/// Human-readable description of the current distribution
fn describe_distribution(config: &CoordinatorConfig, active_chargers: usize) -> String {
    if config.strategy == Strategy::Off {
        return "Off - No load balancing".to_string();
    }

    if active_chargers == 0 {
        return "No active chargers".to_string();
    }

    match config.strategy {
        Strategy::Equal => {
            let per_charger = config.total_budget_a as f64 / active_chargers as f64;
            format!("{} chargers @ {:.1}A each", active_chargers, per_charger)
        }
        Strategy::Priority => format!("Priority: {} chargers", active_chargers),
        Strategy::Off => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charger::StateSnapshot;

    fn handle(id: &str, priority: u32, state: ChargerState, power_w: f64) -> ChargerHandle {
        let mut h = ChargerHandle::new(ChargerId::new(id), priority);
        let mut snap = StateSnapshot::new(state, PlugStatus::PluggedOnStationAndEv);
        snap.power_w = power_w;
        snap.session_energy_kwh = 1.5;
        snap.total_energy_kwh = 100.0;
        h.apply_snapshot(snap);
        h
    }

    #[test]
    fn test_totals_and_active_count() {
        let snapshot = vec![
            handle("a", 1, ChargerState::Charging, 3600.0),
            handle("b", 2, ChargerState::Charging, 7200.0),
            handle("c", 3, ChargerState::Ready, 0.0),
        ];
        let config = CoordinatorConfig {
            strategy: Strategy::Equal,
            ..Default::default()
        };

        let agg = compute(&snapshot, &config);
        assert_eq!(agg.total_power_w, 10800.0);
        assert_eq!(agg.total_session_energy_kwh, 4.5);
        assert_eq!(agg.total_energy_kwh, 300.0);
        assert_eq!(agg.active_chargers, 2);
        assert!(agg.load_balancing_active);
        assert_eq!(agg.charger_states.len(), 3);
    }

    #[test]
    fn test_distribution_strings() {
        let off = CoordinatorConfig::default();
        assert_eq!(
            compute(&[], &off).distribution,
            "Off - No load balancing"
        );

        let equal = CoordinatorConfig {
            total_budget_a: 32,
            strategy: Strategy::Equal,
            ..Default::default()
        };
        assert_eq!(compute(&[], &equal).distribution, "No active chargers");

        let snapshot = vec![
            handle("a", 1, ChargerState::Charging, 0.0),
            handle("b", 2, ChargerState::Charging, 0.0),
        ];
        assert_eq!(
            compute(&snapshot, &equal).distribution,
            "2 chargers @ 16.0A each"
        );

        let priority = CoordinatorConfig {
            strategy: Strategy::Priority,
            ..equal
        };
        assert_eq!(
            compute(&snapshot, &priority).distribution,
            "Priority: 2 chargers"
        );
    }

    #[test]
    fn test_balancing_needs_two_active() {
        let config = CoordinatorConfig {
            strategy: Strategy::Equal,
            ..Default::default()
        };
        let one = vec![handle("a", 1, ChargerState::Charging, 0.0)];
        assert!(!compute(&one, &config).load_balancing_active);
    }
}
