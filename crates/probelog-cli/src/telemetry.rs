//! Bridges protocol events into the log store.

use tracing::warn;

use probelog_net::TelemetrySink;
use probelog_store::SharedLogStore;
use probelog_types::Reading;

/// Records each protocol event as an ordinary store row: the synthetic
/// source id in the sensor column, the event detail in the unit column.
pub struct StoreTelemetry {
    store: SharedLogStore,
}

impl StoreTelemetry {
    pub fn new(store: SharedLogStore) -> Self {
        Self { store }
    }
}

impl TelemetrySink for StoreTelemetry {
    fn record_event(&self, source: &str, value: f64, detail: &str) {
        // Telemetry must never take the data path down with it.
        if let Err(e) = self.store.record(Reading::now(source, value, detail)) {
            warn!("Failed to record telemetry event: {e}");
        }
    }
}
