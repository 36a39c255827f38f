//! Peripheral wire protocol
//!
//! One JSON object per line: `{"type":"<COMMAND>"}\n`.

use crate::error::LinkError;
use alerting::Command;
use serde::{Deserialize, Serialize};

/// Link connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    ConnectionFailed,
    PermissionDenied,
}

impl ConnectionState {
    /// States the link does not leave without the caller reconnecting
    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            ConnectionState::ConnectionFailed | ConnectionState::PermissionDenied
        )
    }
}

/// A single line on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Encode a command as a newline-terminated JSON line
pub fn encode(command: Command) -> Result<Vec<u8>, LinkError> {
    let mut bytes = serde_json::to_vec(&WireMessage {
        kind: command.to_string(),
    })?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decode a line received from the peripheral
pub fn decode_line(line: &str) -> Result<WireMessage, LinkError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(LinkError::InvalidMessage("empty line".into()));
    }
    Ok(serde_json::from_str(line)?)
}
