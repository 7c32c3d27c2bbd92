//! The core sensor observation record.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One timestamped sensor observation.
///
/// Readings are immutable once created. The `sensor_id` is unique within a
/// client but not across deployments; the log store and the wire protocol
/// both treat it as an opaque short string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// When the value was observed, with sub-second precision.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Short sensor identifier, e.g. `T1`.
    pub sensor_id: String,
    /// The observed value.
    pub value: f64,
    /// Unit string, e.g. `°C` or `hPa`.
    pub unit: String,
}

impl Reading {
    /// Create a reading observed at the given instant.
    pub fn new(
        sensor_id: impl Into<String>,
        timestamp: OffsetDateTime,
        value: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            sensor_id: sensor_id.into(),
            value,
            unit: unit.into(),
        }
    }

    /// Create a reading observed now.
    pub fn now(sensor_id: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self::new(sensor_id, OffsetDateTime::now_utc(), value, unit)
    }
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:.2} {}", self.sensor_id, self.value, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_reading_display() {
        let r = Reading::new("T1", datetime!(2025-06-01 12:00:00 UTC), 21.456, "°C");
        assert_eq!(format!("{}", r), "T1 21.46 °C");
    }

    #[test]
    fn test_reading_serde_roundtrip() {
        let r = Reading::new("H1", datetime!(2025-06-01 08:30:15.25 UTC), 55.0, "%");
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("2025-06-01T08:30:15.25Z"));
        let back: Reading = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
