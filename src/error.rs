//! Error types and handling for Kebalance
//!
//! This module defines the error types used throughout the crate,
//! providing consistent error handling and reporting.

use thiserror::Error;

/// Result type alias for Kebalance operations
pub type Result<T> = std::result::Result<T, KebalanceError>;

/// Main error type for Kebalance
#[derive(Debug, Error)]
pub enum KebalanceError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A charger with the same id is already registered
    #[error("Charger {id} is already registered")]
    DuplicateCharger { id: String },

    /// Operation addressed a charger that is not registered
    #[error("Charger {id} is not registered")]
    UnknownCharger { id: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// A current-limit command could not be delivered to a charger
    #[error("Command delivery to charger {charger} failed: {message}")]
    Command { charger: String, message: String },

    /// Transport-level errors (timeouts, unreachable chargers)
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl KebalanceError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        KebalanceError::Config {
            message: message.into(),
        }
    }

    /// Create a new duplicate-charger error
    pub fn duplicate_charger<S: Into<String>>(id: S) -> Self {
        KebalanceError::DuplicateCharger { id: id.into() }
    }

    /// Create a new unknown-charger error
    pub fn unknown_charger<S: Into<String>>(id: S) -> Self {
        KebalanceError::UnknownCharger { id: id.into() }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        KebalanceError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new command-delivery error
    pub fn command<S: Into<String>>(charger: S, message: S) -> Self {
        KebalanceError::Command {
            charger: charger.into(),
            message: message.into(),
        }
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        KebalanceError::Transport {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        KebalanceError::Io {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        KebalanceError::Generic {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for KebalanceError {
    fn from(err: std::io::Error) -> Self {
        KebalanceError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for KebalanceError {
    fn from(err: serde_yaml::Error) -> Self {
        KebalanceError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for KebalanceError {
    fn from(err: serde_json::Error) -> Self {
        KebalanceError::Serialization {
            message: err.to_string(),
        }
    }
}
