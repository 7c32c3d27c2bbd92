//! Wire framing: one JSON object per newline-terminated line.

use probelog_types::SensorPayload;

use crate::error::{Error, Result};

/// The acknowledgement token, compared after trimming whitespace.
pub const ACK: &[u8] = b"ACK";

/// The acknowledgement as sent on the wire.
pub const ACK_LINE: &[u8] = b"ACK\n";

/// Serialize a payload into one wire frame (JSON text plus `\n`).
pub fn encode(payload: &SensorPayload) -> Result<Vec<u8>> {
    let mut frame = serde_json::to_vec(payload).map_err(Error::Encode)?;
    frame.push(b'\n');
    Ok(frame)
}

/// Parse one received line (without or with its terminator) into a payload.
pub fn decode(line: &str) -> Result<SensorPayload> {
    serde_json::from_str(line.trim()).map_err(Error::Decode)
}
