//! Error handling module for tonarchy
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Operator-correctable input problems are NOT errors; they are reported inline
//! by the wizard. Everything here ends the current flow.

use thiserror::Error;

/// Main error type for the installer
#[derive(Error, Debug)]
pub enum TonarchyError {
    /// IO errors (file operations, terminal, spawning children)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A value that failed validation outside the interactive wizard
    #[error("Validation error: {0}")]
    Validation(String),

    /// A privileged command exited unsuccessfully
    #[error("Command failed: {0}")]
    Command(String),

    /// Terminal errors (attributes, rendering, misuse of the menu)
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// The fuzzy picker could not be launched or its input ran dry
    #[error("Picker error: {0}")]
    Picker(String),

    /// Pipeline state errors (out-of-order stages)
    #[error("State error: {0}")]
    State(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for installer operations
pub type Result<T> = std::result::Result<T, TonarchyError>;

impl TonarchyError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a command failure error
    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }

    /// Create a terminal error
    pub fn terminal(msg: impl Into<String>) -> Self {
        Self::Terminal(msg.into())
    }

    /// Create a picker error
    pub fn picker(msg: impl Into<String>) -> Self {
        Self::Picker(msg.into())
    }

    /// Create a state error
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }
}

impl From<crate::install_state::StageTransitionError> for TonarchyError {
    fn from(err: crate::install_state::StageTransitionError) -> Self {
        Self::State(err.to_string())
    }
}
