//! Error types for the virtual pad core
//!
//! Every fallible operation in the library returns [`PadError`]. The driver's
//! own status codes live in [`crate::driver::DriverError`] and are carried by
//! the [`PadError::Protocol`] variant together with the entry point that
//! produced them.

use crate::driver::DriverError;
use thiserror::Error;

/// Library-wide result alias
pub type Result<T, E = PadError> = std::result::Result<T, E>;

/// Errors surfaced by the driver binding, lifecycle, dispatch and key map
#[derive(Debug, Error)]
pub enum PadError {
    /// Module or symbol resolution failed, the binding is unusable
    #[error("Driver load failed: {0}")]
    Load(String),

    /// A driver entry point reported failure
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Startup/shutdown invoked in a state that does not allow it
    #[error("Invalid state: {0}")]
    State(#[from] StateError),

    /// Unknown controller profile or invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PadError {
    /// Driver status code, when the error came from the driver
    pub fn driver_code(&self) -> Option<DriverError> {
        match self {
            PadError::Protocol(ProtocolError::Status { code, .. }) => Some(*code),
            _ => None,
        }
    }

    pub(crate) fn status(call: &'static str, code: DriverError) -> Self {
        PadError::Protocol(ProtocolError::Status { call, code })
    }

    pub(crate) fn null_handle(call: &'static str) -> Self {
        PadError::Protocol(ProtocolError::NullHandle { call })
    }
}

/// Failures reported by driver entry points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Non-success status code
    #[error("{call} returned {code}")]
    Status {
        call: &'static str,
        code: DriverError,
    },
    /// Allocator returned an empty handle
    #[error("{call} returned a null handle")]
    NullHandle { call: &'static str },
}

/// Lifecycle states that reject a requested transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("no driver module is loaded")]
    NotLoaded,
    #[error("virtual controller is already active")]
    AlreadyActive,
    #[error("virtual controller is not active")]
    NotActive,
}

/// Key text that cannot be turned into a [`crate::keys::Key`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("empty key sequence")]
    Empty,
    #[error("unsupported key: {0}")]
    Unsupported(String),
}
