//! # Kebalance - Load-balancing coordinator for Keba EV chargers
//!
//! A Rust implementation of a multi-charger load-balancing coordinator:
//! given N chargers sharing a finite current budget, decide in real time
//! how many amps each actively charging charger may draw, reacting to
//! charging-state transitions and operator configuration changes.
//!
//! The UDP wire protocol, charger discovery, and host entity surfaces are
//! external collaborators behind the [`transport::ChargerTransport`] and
//! [`coordinator::LifecycleHooks`] traits; this crate owns the allocation
//! algorithm and its concurrency and consistency contract.
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `charger`: Charger identity, state enums, and observed snapshots
//! - `registry`: Live set of registered chargers
//! - `allocation`: Allocation engine (Off / Equal / Priority strategies)
//! - `aggregate`: Read-only metrics over a registry snapshot
//! - `transport`: Command boundary toward the charger protocol stack
//! - `coordinator`: The coordinator itself: mutex boundary, lifecycle,
//!   recomputation triggers, command dispatch with rollback
//! - `persistence`: File-backed storage for operator settings

pub mod aggregate;
pub mod allocation;
pub mod charger;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod persistence;
pub mod registry;
pub mod transport;

// Re-export commonly used types
pub use charger::{ChargerId, ChargerState, PlugStatus, StateSnapshot};
pub use config::{Config, CoordinatorConfig, Strategy};
pub use coordinator::Coordinator;
pub use error::{KebalanceError, Result};
