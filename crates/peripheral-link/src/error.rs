//! Link Error Types

use crate::protocol::ConnectionState;
use thiserror::Error;

/// Errors that can occur while talking to the peripheral
#[derive(Debug, Error)]
pub enum LinkError {
    /// Serial port could not be opened or used
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// Serial device does not exist
    #[error("Serial device not found: {0}")]
    DeviceNotFound(String),

    /// Access to the device was refused
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Write did not complete in time
    #[error("Timeout writing to peripheral after {0}ms")]
    Timeout(u64),

    /// Operation needs an open link
    #[error("Peripheral not connected")]
    NotConnected,

    /// A pre-opened stream can only be connected once
    #[error("Stream endpoint already consumed")]
    StreamConsumed,

    /// Line could not be encoded or decoded
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinkError {
    /// Connection state this error leaves the link in
    pub fn connection_state(&self) -> ConnectionState {
        match self {
            LinkError::PermissionDenied(_) => ConnectionState::PermissionDenied,
            LinkError::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                ConnectionState::PermissionDenied
            }
            _ => ConnectionState::ConnectionFailed,
        }
    }
}

impl From<tokio_serial::Error> for LinkError {
    fn from(err: tokio_serial::Error) -> Self {
        match err.kind {
            tokio_serial::ErrorKind::NoDevice => LinkError::DeviceNotFound(err.description),
            tokio_serial::ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => {
                LinkError::PermissionDenied(err.description)
            }
            _ => LinkError::SerialError(err.description),
        }
    }
}

impl From<serde_json::Error> for LinkError {
    fn from(err: serde_json::Error) -> Self {
        LinkError::InvalidMessage(err.to_string())
    }
}
