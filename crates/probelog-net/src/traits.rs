//! Seam traits connecting the network layer to its collaborators.

use std::net::SocketAddr;

use probelog_types::SensorPayload;

/// Receives every decoded payload the listener accepts.
///
/// Presentation layers (tables, dashboards) implement this instead of
/// wrapping the listener itself; the listener never learns who consumes
/// the data.
pub trait PayloadObserver: Send + Sync {
    /// Called once per successfully parsed inbound message, in arrival
    /// order for any single connection.
    fn on_payload(&self, peer: SocketAddr, payload: &SensorPayload);
}

impl<F> PayloadObserver for F
where
    F: Fn(SocketAddr, &SensorPayload) + Send + Sync,
{
    fn on_payload(&self, peer: SocketAddr, payload: &SensorPayload) {
        self(peer, payload)
    }
}

/// Records protocol events (connects, sends, ACKs, errors) for later
/// diagnosis.
///
/// The log store acts as the sink in the reference wiring, turning each
/// event into an ordinary reading under a synthetic sensor id (`network`
/// on the client side, `server` on the server side).
pub trait TelemetrySink: Send + Sync {
    /// Record one event: a source id, a numeric value (commonly 1/0 for
    /// success/failure or a byte count), and a short detail string.
    fn record_event(&self, source: &str, value: f64, detail: &str);
}
