use anyhow::Result;
use async_trait::async_trait;
use kebalance::charger::{ChargerState, PlugStatus};
use kebalance::coordinator::Coordinator;
use kebalance::persistence::PersistenceManager;
use kebalance::transport::ChargerTransport;
use kebalance::{ChargerId, Config, StateSnapshot, Strategy};
use std::sync::Arc;
use tracing::info;

/// Transport that only logs commands. Stands in for the UDP protocol stack
/// so the coordinator can be exercised without hardware.
struct LoggingTransport;

#[async_trait]
impl ChargerTransport for LoggingTransport {
    async fn send_current_limit(&self, charger: &ChargerId, amps: u32) -> kebalance::Result<()> {
        info!("transport: curr {} -> {} A", charger, amps);
        Ok(())
    }

    async fn display_text(&self, charger: &ChargerId, text: &str) -> kebalance::Result<()> {
        info!("transport: display {} -> {:?}", charger, text);
        Ok(())
    }
}

fn charging_snapshot(power_w: f64) -> StateSnapshot {
    let mut snap = StateSnapshot::new(
        ChargerState::Charging,
        PlugStatus::PluggedOnStationAndEvLocked,
    );
    snap.power_w = power_w;
    snap
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    kebalance::logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Kebalance {} starting up", env!("APP_VERSION"));

    // Operator settings persisted from a previous run win over file defaults
    let mut persistence = PersistenceManager::new(&config.persistence.state_file);
    let coordinator_config = match persistence.load() {
        Ok(()) => persistence.coordinator_config().clone(),
        Err(e) => {
            info!("Persisted state unavailable ({}), using config file", e);
            config.coordinator.clone()
        }
    };

    let coordinator = Coordinator::new(coordinator_config, Arc::new(LoggingTransport))
        .map_err(|e| anyhow::anyhow!("Failed to create coordinator: {}", e))?;

    // Walk the coordinator through a small scripted scenario. A real host
    // would feed it polled snapshots and operator input instead.
    let left = ChargerId::new("garage-left");
    let right = ChargerId::new("garage-right");
    coordinator.register_charger(left.clone()).await?;
    coordinator.register_charger(right.clone()).await?;

    coordinator.set_strategy(Strategy::Equal).await?;
    coordinator.set_budget(32).await?;

    coordinator
        .on_state_update(&left, charging_snapshot(3680.0))
        .await?;
    let aggregates = coordinator
        .on_state_update(&right, charging_snapshot(7360.0))
        .await?;
    info!(
        "Aggregates: {:.0} W over {} active chargers ({})",
        aggregates.total_power_w, aggregates.active_chargers, aggregates.distribution
    );

    coordinator.set_strategy(Strategy::Priority).await?;
    coordinator.set_priority(&right, 1).await?;
    for (id, amps) in coordinator.get_per_charger_limits().await {
        info!("Charger {}: limit {:?} A", id, amps);
    }

    // Persist the operator settings for the next run (best-effort)
    persistence.set_coordinator_config(coordinator.config().await);
    if let Err(e) = persistence.save() {
        info!("Could not persist state: {}", e);
    }

    info!("Kebalance shutdown complete");
    Ok(())
}
