//! Store configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Rotation and retention policy for the log store.
///
/// Each trigger is independent: any one of the age, size, or row-count
/// thresholds being reached forces a rotation on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory for active log files.
    pub log_dir: PathBuf,
    /// strftime-style template for active file names.
    ///
    /// Supported directives: `%Y %m %d %H %M %S %%`.
    pub filename_pattern: String,
    /// Rows held in memory before a forced flush.
    pub buffer_size: usize,
    /// Wall-clock age trigger, in hours.
    pub rotate_every_hours: f64,
    /// File-size trigger, in megabytes.
    pub max_size_mb: f64,
    /// Row-count trigger.
    pub rotate_after_lines: u64,
    /// Archives older than this many days are pruned at rotation time.
    pub retention_days: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("./logs"),
            filename_pattern: "sensors_%Y%m%d.csv".to_string(),
            buffer_size: 100,
            rotate_every_hours: 24.0,
            max_size_mb: 10.0,
            rotate_after_lines: 100,
            retention_days: 30,
        }
    }
}

impl StoreConfig {
    /// The directory rotated archives are written to.
    pub fn archive_dir(&self) -> PathBuf {
        self.log_dir.join("archive")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.filename_pattern, "sensors_%Y%m%d.csv");
        assert_eq!(config.buffer_size, 100);
        assert_eq!(config.rotate_after_lines, 100);
        assert_eq!(config.retention_days, 30);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"log_dir": "/tmp/x", "buffer_size": 2}"#).unwrap();
        assert_eq!(config.log_dir, PathBuf::from("/tmp/x"));
        assert_eq!(config.buffer_size, 2);
        assert_eq!(config.rotate_every_hours, 24.0);
    }

    #[test]
    fn test_archive_dir() {
        let config = StoreConfig {
            log_dir: PathBuf::from("/var/log/probelog"),
            ..Default::default()
        };
        assert_eq!(
            config.archive_dir(),
            PathBuf::from("/var/log/probelog/archive")
        );
    }
}
