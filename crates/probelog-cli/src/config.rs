//! Runtime configuration for the probelog binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use probelog_net::NetworkConfig;
use probelog_store::StoreConfig;

/// The JSON configuration file: store keys at the top level, network
/// settings under a `network` object. Every key is optional and falls
/// back to its default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log store settings (flat keys: `log_dir`, `buffer_size`, ...).
    #[serde(flatten)]
    pub store: StoreConfig,
    /// Client/server network settings.
    pub network: NetworkConfig,
}

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// A missing or unparsable file is fatal at startup; the binary does
    /// not fall back to defaults for a path the user named.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }
}

/// Errors loading the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "log_dir": "/tmp/probelog",
                "buffer_size": 5,
                "rotate_after_lines": 50,
                "network": {{"host": "collector.local", "port": 7000, "timeout": 1.5, "retries": 2}}
            }}"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.store.log_dir, PathBuf::from("/tmp/probelog"));
        assert_eq!(config.store.buffer_size, 5);
        assert_eq!(config.network.addr(), "collector.local:7000");
        assert_eq!(config.network.retries, 2);
    }

    #[test]
    fn test_empty_object_is_all_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.store.buffer_size, 100);
        assert_eq!(config.network.addr(), "localhost:5000");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Config::load("/nonexistent/probelog.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
