//! Wire payload types.
//!
//! One [`SensorPayload`] is what the client sends per collection cycle: a
//! JSON object keyed by sensor id, each value carrying the sensor's display
//! name, latest value, unit, and observation timestamp.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Reading;

/// One sensor's slot in a [`SensorPayload`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadEntry {
    /// Human-readable sensor name.
    pub name: String,
    /// Latest observed value.
    pub value: f64,
    /// Unit string.
    pub unit: String,
    /// When the value was observed.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// A batch of sensor values sent as a single wire message.
///
/// Serializes as a plain JSON object (`{"T1": {...}, "H1": {...}}`), which
/// is the on-the-wire format; key order is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorPayload(BTreeMap<String, PayloadEntry>);

impl SensorPayload {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for a sensor id.
    pub fn insert(&mut self, sensor_id: impl Into<String>, entry: PayloadEntry) {
        self.0.insert(sensor_id.into(), entry);
    }

    /// Add a reading under a display name.
    pub fn push_reading(&mut self, name: impl Into<String>, reading: &Reading) {
        self.insert(
            reading.sensor_id.clone(),
            PayloadEntry {
                name: name.into(),
                value: reading.value,
                unit: reading.unit.clone(),
                timestamp: reading.timestamp,
            },
        );
    }

    /// Number of sensors in the payload.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the payload carries no sensors.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(sensor_id, entry)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PayloadEntry)> {
        self.0.iter()
    }
}
