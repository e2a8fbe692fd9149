//! Charger identity and observed state
//!
//! Types describing a single Keba charger as seen by the coordinator:
//! its id, the state and plug status reported by the device, the latest
//! measurements, and the commanded-limit bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest current limit (A) a charger accepts while charging is enabled
pub const MIN_CHARGER_CURRENT_A: u32 = 6;

/// Highest current limit (A) a single charger accepts
pub const MAX_CHARGER_CURRENT_A: u32 = 32;

/// Stable identity of a charger (network address or host-assigned id)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChargerId(String);

impl ChargerId {
    /// Create a new charger id
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChargerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChargerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Charging state as reported in the `State` field of report 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargerState {
    /// Charger is starting up
    Starting,

    /// Charger is not ready (not enabled, not authorized, ...)
    NotReady,

    /// Ready to charge, waiting for the vehicle
    Ready,

    /// Actively delivering energy
    Charging,

    /// Device error
    Error,

    /// RFID authorization was rejected
    AuthorizationRejected,
}

impl ChargerState {
    /// Map the numeric report-2 state code to a state
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Starting),
            1 => Some(Self::NotReady),
            2 => Some(Self::Ready),
            3 => Some(Self::Charging),
            4 => Some(Self::Error),
            5 => Some(Self::AuthorizationRejected),
            _ => None,
        }
    }

    /// Whether this state counts as charging-active for load balancing
    pub fn is_charging(self) -> bool {
        matches!(self, Self::Charging)
    }
}

/// Plug status as reported in the `Plug` field of report 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlugStatus {
    /// No cable plugged
    Unplugged,

    /// Cable plugged on the station only
    PluggedOnStation,

    /// Cable plugged and locked on the station
    PluggedOnStationLocked,

    /// Cable plugged on the station and the vehicle
    PluggedOnStationAndEv,

    /// Cable plugged on both ends and locked
    PluggedOnStationAndEvLocked,
}

impl PlugStatus {
    /// Map the numeric report-2 plug code to a status
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Unplugged),
            1 => Some(Self::PluggedOnStation),
            3 => Some(Self::PluggedOnStationLocked),
            5 => Some(Self::PluggedOnStationAndEv),
            7 => Some(Self::PluggedOnStationAndEvLocked),
            _ => None,
        }
    }
}

/// One freshly polled measurement set for a charger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Reported charging state
    pub state: ChargerState,

    /// Reported plug status
    pub plug: PlugStatus,

    /// Active power (W)
    pub power_w: f64,

    /// Energy delivered in the current session (kWh)
    pub session_energy_kwh: f64,

    /// Lifetime energy counter (kWh)
    pub total_energy_kwh: f64,

    /// Per-phase voltages (V)
    pub l1_voltage: f64,
    pub l2_voltage: f64,
    pub l3_voltage: f64,

    /// Per-phase currents (A)
    pub l1_current: f64,
    pub l2_current: f64,
    pub l3_current: f64,

    /// Hardware current ceiling reported by the device (A), if known
    pub max_current_hw_a: Option<u32>,

    /// When this snapshot was received
    pub received_at: DateTime<Utc>,
}

impl StateSnapshot {
    /// Create a snapshot with the given state/plug and zeroed measurements
    pub fn new(state: ChargerState, plug: PlugStatus) -> Self {
        Self {
            state,
            plug,
            power_w: 0.0,
            session_energy_kwh: 0.0,
            total_energy_kwh: 0.0,
            l1_voltage: 0.0,
            l2_voltage: 0.0,
            l3_voltage: 0.0,
            l1_current: 0.0,
            l2_current: 0.0,
            l3_current: 0.0,
            max_current_hw_a: None,
            received_at: Utc::now(),
        }
    }
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self::new(ChargerState::Starting, PlugStatus::Unplugged)
    }
}

/// A registered charger as tracked by the coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargerHandle {
    /// Charger identity
    pub id: ChargerId,

    /// Assigned priority (positive, lower means higher priority)
    pub priority: u32,

    /// Device minimum current (A), protocol-fixed
    pub min_current_a: u32,

    /// Device maximum current (A)
    pub max_current_a: u32,

    /// Latest observed state
    pub snapshot: StateSnapshot,

    /// Last current limit (A) confirmed by the charger.
    /// `None` means unknown or unconfirmed; the next allocation pass
    /// re-sends the limit regardless of whether it changed.
    pub commanded_limit_a: Option<u32>,
}

impl ChargerHandle {
    /// Create a handle with default bounds and an initial idle snapshot
    pub fn new(id: ChargerId, priority: u32) -> Self {
        Self {
            id,
            priority,
            min_current_a: MIN_CHARGER_CURRENT_A,
            max_current_a: MAX_CHARGER_CURRENT_A,
            snapshot: StateSnapshot::default(),
            commanded_limit_a: None,
        }
    }

    /// Whether the charger is actively charging
    pub fn is_charging(&self) -> bool {
        self.snapshot.state.is_charging()
    }

    /// Effective per-charger ceiling: the device maximum, never above
    /// the protocol maximum
    pub fn ceiling_a(&self) -> u32 {
        self.max_current_a.min(MAX_CHARGER_CURRENT_A)
    }

    /// Apply a freshly polled snapshot, refreshing the hardware ceiling
    /// when the device reports one
    pub fn apply_snapshot(&mut self, snapshot: StateSnapshot) {
        if let Some(hw) = snapshot.max_current_hw_a
            && hw >= MIN_CHARGER_CURRENT_A
        {
            self.max_current_a = hw.min(MAX_CHARGER_CURRENT_A);
        }
        self.snapshot = snapshot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_codes() {
        assert_eq!(ChargerState::from_code(3), Some(ChargerState::Charging));
        assert_eq!(
            ChargerState::from_code(5),
            Some(ChargerState::AuthorizationRejected)
        );
        assert_eq!(ChargerState::from_code(6), None);
        assert!(ChargerState::Charging.is_charging());
        assert!(!ChargerState::Ready.is_charging());
    }

    #[test]
    fn test_plug_codes() {
        assert_eq!(PlugStatus::from_code(0), Some(PlugStatus::Unplugged));
        assert_eq!(
            PlugStatus::from_code(7),
            Some(PlugStatus::PluggedOnStationAndEvLocked)
        );
        assert_eq!(PlugStatus::from_code(2), None);
    }

    #[test]
    fn test_hardware_ceiling_applies() {
        let mut handle = ChargerHandle::new(ChargerId::new("a"), 1);
        assert_eq!(handle.ceiling_a(), MAX_CHARGER_CURRENT_A);

        let mut snap = StateSnapshot::new(ChargerState::Charging, PlugStatus::PluggedOnStationAndEv);
        snap.max_current_hw_a = Some(16);
        handle.apply_snapshot(snap);
        assert_eq!(handle.ceiling_a(), 16);

        // Ceilings above the protocol maximum are capped
        let mut snap = StateSnapshot::default();
        snap.max_current_hw_a = Some(63);
        handle.apply_snapshot(snap);
        assert_eq!(handle.ceiling_a(), MAX_CHARGER_CURRENT_A);
    }
}
