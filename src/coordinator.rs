//! Multi-charger load-balancing coordinator
//!
//! Owns the charger registry and the operator configuration behind a single
//! mutex, recomputes allocations on charging-state transitions and config
//! changes, and dispatches limit commands to the transport after the lock
//! is released. Delivery failures roll the affected charger's bookkeeping
//! back to unknown so the next trigger retries that charger only.

use crate::aggregate::{self, Aggregates};
use crate::allocation::{self, AllocationResult};
use crate::charger::{ChargerHandle, ChargerId, StateSnapshot};
use crate::config::{CoordinatorConfig, Strategy};
use crate::error::{KebalanceError, Result};
use crate::logging::get_logger;
use crate::registry::ChargerRegistry;
use crate::transport::{ChargerTransport, format_display_message};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Lifecycle of the coordinator relative to its charger pool.
///
/// With zero or one charger there is nothing to balance and no
/// coordinator-level entities should exist on the host side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorLifecycle {
    /// At most one charger registered; no automatic allocation
    SingleCharger,

    /// Two or more chargers registered; load balancing in effect
    MultiCharger,
}

/// Host callbacks for lifecycle transitions (entity create/destroy)
#[async_trait]
pub trait LifecycleHooks: Send + Sync {
    /// A second charger appeared; the host should create its
    /// coordinator-level entities
    async fn on_coordination_started(&self) {}

    /// The pool shrank back to at most one charger; the host should remove
    /// its coordinator-level entities
    async fn on_coordination_stopped(&self) {}
}

/// Default no-op hooks for hosts without entity surfaces
pub struct NoopHooks;

#[async_trait]
impl LifecycleHooks for NoopHooks {}

/// One limit command headed for the transport
struct LimitCommand {
    id: ChargerId,
    amps: u32,
    display: String,
}

/// Mutable coordinator state, guarded by one mutex
struct CoordinatorState {
    registry: ChargerRegistry,
    config: CoordinatorConfig,
    lifecycle: CoordinatorLifecycle,
    last_result: Option<AllocationResult>,
}

/// Load-balancing coordinator for a pool of chargers
pub struct Coordinator {
    state: Mutex<CoordinatorState>,
    transport: Arc<dyn ChargerTransport>,
    hooks: Arc<dyn LifecycleHooks>,
    logger: crate::logging::StructuredLogger,
}

impl Coordinator {
    /// Create a coordinator with no-op lifecycle hooks
    pub fn new(config: CoordinatorConfig, transport: Arc<dyn ChargerTransport>) -> Result<Self> {
        Self::with_hooks(config, transport, Arc::new(NoopHooks))
    }

    /// Create a coordinator with host lifecycle hooks
    pub fn with_hooks(
        config: CoordinatorConfig,
        transport: Arc<dyn ChargerTransport>,
        hooks: Arc<dyn LifecycleHooks>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: Mutex::new(CoordinatorState {
                registry: ChargerRegistry::new(),
                config,
                lifecycle: CoordinatorLifecycle::SingleCharger,
                last_result: None,
            }),
            transport,
            hooks,
            logger: get_logger("coordinator"),
        })
    }

    /// Register a charger. Its priority comes from the configured priority
    /// map, defaulting for unknown ids.
    pub async fn register_charger(&self, id: ChargerId) -> Result<()> {
        let (commands, started) = {
            let mut state = self.state.lock().await;
            let priority = state.config.priority_for(&id);
            state.registry.register(ChargerHandle::new(id, priority))?;

            let started = state.lifecycle == CoordinatorLifecycle::SingleCharger
                && state.registry.len() >= 2;
            if started {
                state.lifecycle = CoordinatorLifecycle::MultiCharger;
                self.logger
                    .info("Second charger registered, load balancing active");
            }
            (Self::plan_locked(&mut state), started)
        };

        if started {
            self.hooks.on_coordination_started().await;
        }
        self.dispatch(commands).await;
        Ok(())
    }

    /// Deregister a charger.
    ///
    /// Dropping to a single charger tears the coordination down: the
    /// remaining charger keeps its last commanded limit and no further
    /// automatic allocation happens until a second charger returns.
    pub async fn deregister_charger(&self, id: &ChargerId) -> Result<()> {
        let (commands, stopped) = {
            let mut state = self.state.lock().await;
            state.registry.deregister(id)?;

            if state.registry.len() <= 1 {
                let stopped = state.lifecycle == CoordinatorLifecycle::MultiCharger;
                if stopped {
                    state.lifecycle = CoordinatorLifecycle::SingleCharger;
                    state.last_result = None;
                    self.logger
                        .info("Charger pool down to one, load balancing torn down");
                }
                (Vec::new(), stopped)
            } else {
                (Self::plan_locked(&mut state), false)
            }
        };

        if stopped {
            self.hooks.on_coordination_stopped().await;
        }
        self.dispatch(commands).await;
        Ok(())
    }

    /// Apply a freshly polled state snapshot.
    ///
    /// Recomputes the allocation only when the charging-active flag
    /// transitioned; idle updates just refresh the aggregates, keeping
    /// command traffic off the wire.
    pub async fn on_state_update(&self, id: &ChargerId, snapshot: StateSnapshot) -> Result<Aggregates> {
        let (aggregates, commands) = {
            let mut state = self.state.lock().await;
            let transitioned = state.registry.update_state(id, snapshot)?;

            let commands = if transitioned {
                Self::plan_locked(&mut state)
            } else {
                Vec::new()
            };
            let aggregates = aggregate::compute(&state.registry.snapshot_all(), &state.config);
            (aggregates, commands)
        };

        self.dispatch(commands).await;
        Ok(aggregates)
    }

    /// Replace the whole coordinator configuration.
    ///
    /// Invalid configurations are rejected before being applied, leaving
    /// the prior valid configuration intact.
    pub async fn on_config_change(&self, new_config: CoordinatorConfig) -> Result<()> {
        new_config.validate()?;

        let commands = {
            let mut state = self.state.lock().await;
            self.logger.info(&format!(
                "Config change: budget {} A, strategy {}",
                new_config.total_budget_a, new_config.strategy
            ));
            state.config = new_config;

            // Re-resolve handle priorities against the new map
            let ids: Vec<ChargerId> = state
                .registry
                .snapshot_all()
                .into_iter()
                .map(|h| h.id)
                .collect();
            for id in ids {
                let priority = state.config.priority_for(&id);
                if let Some(handle) = state.registry.get_mut(&id) {
                    handle.priority = priority;
                }
            }

            Self::plan_locked(&mut state)
        };

        self.dispatch(commands).await;
        Ok(())
    }

    /// Set the total current budget (A)
    pub async fn set_budget(&self, amps: u32) -> Result<()> {
        let mut config = self.config().await;
        config.total_budget_a = amps;
        self.on_config_change(config).await
    }

    /// Set the load-balancing strategy
    pub async fn set_strategy(&self, strategy: Strategy) -> Result<()> {
        let mut config = self.config().await;
        config.strategy = strategy;
        self.on_config_change(config).await
    }

    /// Set the priority of one registered charger.
    ///
    /// Only triggers a rebalance when the Priority strategy is active.
    pub async fn set_priority(&self, id: &ChargerId, priority: u32) -> Result<()> {
        if priority == 0 {
            return Err(KebalanceError::validation(
                format!("priorities.{}", id),
                "Priority must be positive".to_string(),
            ));
        }

        let commands = {
            let mut state = self.state.lock().await;
            let handle = state
                .registry
                .get_mut(id)
                .ok_or_else(|| KebalanceError::unknown_charger(id.as_str()))?;
            handle.priority = priority;
            state.config.priorities.insert(id.clone(), priority);

            if state.config.strategy == Strategy::Priority {
                Self::plan_locked(&mut state)
            } else {
                Vec::new()
            }
        };

        self.dispatch(commands).await;
        Ok(())
    }

    /// Current aggregates over the charger pool
    pub async fn get_aggregates(&self) -> Aggregates {
        let state = self.state.lock().await;
        aggregate::compute(&state.registry.snapshot_all(), &state.config)
    }

    /// Last confirmed per-charger limits (A). `None` marks a charger whose
    /// limit is unknown or whose last command went unacknowledged.
    pub async fn get_per_charger_limits(&self) -> BTreeMap<ChargerId, Option<u32>> {
        let state = self.state.lock().await;
        state
            .registry
            .snapshot_all()
            .into_iter()
            .map(|h| (h.id, h.commanded_limit_a))
            .collect()
    }

    /// Current coordinator configuration
    pub async fn config(&self) -> CoordinatorConfig {
        self.state.lock().await.config.clone()
    }

    /// Current lifecycle state
    pub async fn lifecycle(&self) -> CoordinatorLifecycle {
        self.state.lock().await.lifecycle
    }

    /// Result of the most recent allocation pass, if any
    pub async fn last_allocation(&self) -> Option<AllocationResult> {
        self.state.lock().await.last_result.clone()
    }

    /// Compute an allocation pass under the lock and collect the commands
    /// whose planned limit differs from the confirmed one.
    ///
    /// Allocation only runs while coordinating two or more chargers; with
    /// the Off strategy the plan carries aggregates but no limits.
    fn plan_locked(state: &mut CoordinatorState) -> Vec<LimitCommand> {
        if state.lifecycle != CoordinatorLifecycle::MultiCharger {
            return Vec::new();
        }

        let result = allocation::plan(&state.registry.snapshot_all(), &state.config);
        let mut commands = Vec::new();
        for (id, amps) in &result.limits {
            let Some(handle) = state.registry.get(id) else {
                continue;
            };
            if handle.commanded_limit_a != Some(*amps) {
                commands.push(LimitCommand {
                    id: id.clone(),
                    amps: *amps,
                    display: format_display_message(state.config.strategy, handle.priority, *amps),
                });
            }
        }
        state.last_result = Some(result);
        commands
    }

    /// Deliver limit commands outside the state lock.
    ///
    /// Each command is acknowledged independently: a failure marks only
    /// that charger's limit as unconfirmed and the next trigger retries it.
    async fn dispatch(&self, commands: Vec<LimitCommand>) {
        for command in commands {
            match self
                .transport
                .send_current_limit(&command.id, command.amps)
                .await
            {
                Ok(()) => {
                    {
                        let mut state = self.state.lock().await;
                        state
                            .registry
                            .set_commanded_limit(&command.id, Some(command.amps));
                    }
                    self.logger.debug(&format!(
                        "Set charger {} to {} A",
                        command.id, command.amps
                    ));

                    if !command.display.is_empty()
                        && let Err(e) = self
                            .transport
                            .display_text(&command.id, &command.display)
                            .await
                    {
                        self.logger.debug(&format!(
                            "Display message to {} failed: {}",
                            command.id, e
                        ));
                    }
                }
                Err(e) => {
                    self.logger.warn(&format!(
                        "Failed to set current limit for {}: {}; will retry on next trigger",
                        command.id, e
                    ));
                    let mut state = self.state.lock().await;
                    state.registry.set_commanded_limit(&command.id, None);
                }
            }
        }
    }
}
