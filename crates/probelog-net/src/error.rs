//! Error types for probelog-net.

use std::time::Duration;

/// Result type for probelog-net operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in probelog-net.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// TCP connect to the peer failed.
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// An operation did not complete within its timeout.
    #[error("Timed out after {duration:?} waiting for {operation}")]
    Timeout {
        operation: &'static str,
        duration: Duration,
    },

    /// The peer answered with something other than the ACK token.
    #[error("Unexpected acknowledgement: {0:?}")]
    BadAck(String),

    /// Every send attempt failed.
    #[error("Send failed after {attempts} attempt(s)")]
    RetriesExhausted { attempts: u32 },

    /// Operation requires a connection but none is open.
    #[error("Not connected")]
    NotConnected,

    /// Payload could not be serialized for the wire.
    #[error("Failed to encode payload: {0}")]
    Encode(serde_json::Error),

    /// An inbound frame was not a well-formed payload.
    #[error("Failed to decode frame: {0}")]
    Decode(serde_json::Error),

    /// Socket-level error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures of the transport itself, where the connection is
    /// torn down and re-established before the next attempt. Timeouts and
    /// unexpected ACKs mean the peer is alive and keep the connection.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Io(_) | Error::NotConnected | Error::Connect { .. })
    }
}
