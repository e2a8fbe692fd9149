//! Transport boundary toward the charger protocol stack
//!
//! The coordinator never speaks the UDP wire protocol itself; it hands
//! limit commands and display messages to a [`ChargerTransport`] owned by
//! the host. Implementations are expected to multiplex multiple chargers
//! over one socket and resolve ids to network addresses themselves.

use crate::charger::ChargerId;
use crate::config::Strategy;
use crate::error::Result;
use async_trait::async_trait;

/// Longest text the charger display accepts
pub const MAX_DISPLAY_LENGTH: usize = 23;

/// Commands the coordinator sends toward chargers
#[async_trait]
pub trait ChargerTransport: Send + Sync {
    /// Command a new charging current limit, in whole amps.
    ///
    /// Returns `Ok` only once the charger acknowledged the command; a
    /// timeout or negative reply is an error so the coordinator can roll
    /// back its bookkeeping and retry on the next trigger.
    async fn send_current_limit(&self, charger: &ChargerId, amps: u32) -> Result<()>;

    /// Show a short status text on the charger display. Best effort.
    async fn display_text(&self, charger: &ChargerId, text: &str) -> Result<()> {
        let _ = (charger, text);
        Ok(())
    }
}

/// Build the display feedback for an applied limit, truncated to the
/// display's maximum length
pub fn format_display_message(strategy: Strategy, priority: u32, amps: u32) -> String {
    let mut message = match strategy {
        Strategy::Equal => format!("LoadBal Equal {}A", amps),
        Strategy::Priority => format!("LoadBal Prio{} {}A", priority, amps),
        Strategy::Off => String::new(),
    };
    message.truncate(MAX_DISPLAY_LENGTH);
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            format_display_message(Strategy::Equal, 1, 16),
            "LoadBal Equal 16A"
        );
        assert_eq!(
            format_display_message(Strategy::Priority, 2, 10),
            "LoadBal Prio2 10A"
        );
    }

    #[test]
    fn test_display_truncation() {
        let message = format_display_message(Strategy::Priority, 123456789, 32);
        assert!(message.len() <= MAX_DISPLAY_LENGTH);
    }
}
