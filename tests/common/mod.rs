use async_trait::async_trait;
use kebalance::charger::{ChargerState, PlugStatus};
use kebalance::transport::ChargerTransport;
use kebalance::{ChargerId, KebalanceError, StateSnapshot};
use std::collections::HashSet;
use std::sync::Mutex;

/// Transport double that records commands and can be told to fail
/// delivery for specific chargers.
#[derive(Default)]
pub struct MockTransport {
    sent: Mutex<Vec<(ChargerId, u32)>>,
    displayed: Mutex<Vec<(ChargerId, String)>>,
    failing: Mutex<HashSet<ChargerId>>,
}

impl MockTransport {
    pub fn sent(&self) -> Vec<(ChargerId, u32)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn displayed(&self) -> Vec<(ChargerId, String)> {
        self.displayed.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
        self.displayed.lock().unwrap().clear();
    }

    pub fn fail_for(&self, id: &ChargerId) {
        self.failing.lock().unwrap().insert(id.clone());
    }

    pub fn recover(&self, id: &ChargerId) {
        self.failing.lock().unwrap().remove(id);
    }
}

#[async_trait]
impl ChargerTransport for MockTransport {
    async fn send_current_limit(&self, charger: &ChargerId, amps: u32) -> kebalance::Result<()> {
        if self.failing.lock().unwrap().contains(charger) {
            return Err(KebalanceError::transport("ack timeout"));
        }
        self.sent.lock().unwrap().push((charger.clone(), amps));
        Ok(())
    }

    async fn display_text(&self, charger: &ChargerId, text: &str) -> kebalance::Result<()> {
        self.displayed
            .lock()
            .unwrap()
            .push((charger.clone(), text.to_string()));
        Ok(())
    }
}

pub fn charging() -> StateSnapshot {
    StateSnapshot::new(
        ChargerState::Charging,
        PlugStatus::PluggedOnStationAndEvLocked,
    )
}

pub fn plugged_idle() -> StateSnapshot {
    StateSnapshot::new(ChargerState::Ready, PlugStatus::PluggedOnStationAndEv)
}
