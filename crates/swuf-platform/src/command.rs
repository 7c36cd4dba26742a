//! Client -> worker command protocol
//!
//! The message channel carries bytes, not shared in-process types. Commands
//! are JSON-encoded as `{"message": "SKIP_WAITING"}` so the worker side can
//! decode them with an ordinary message listener. No response travels back on
//! this channel; completion is observed via the controller-change event.

use serde::{Deserialize, Serialize};

use crate::PlatformError;

/// A control command posted to a specific worker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "message", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientCommand {
    /// Ask a waiting worker to activate immediately instead of waiting for
    /// all controlled pages to close.
    SkipWaiting,
}

/// Encode a command for the message channel.
pub fn encode(command: &ClientCommand) -> Result<Vec<u8>, PlatformError> {
    serde_json::to_vec(command).map_err(|e| PlatformError::InvalidMessage(e.to_string()))
}

/// Decode a command received on the message channel.
pub fn decode(payload: &[u8]) -> Result<ClientCommand, PlatformError> {
    serde_json::from_slice(payload).map_err(|e| PlatformError::InvalidMessage(e.to_string()))
}
