//! Network configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the `network` object of the configuration file.
///
/// The client uses all four fields; the server only `port`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Peer host for the client role.
    pub host: String,
    /// Peer port (client) or listen port (server).
    pub port: u16,
    /// Connect and read timeout, in seconds.
    #[serde(rename = "timeout")]
    pub timeout_secs: f64,
    /// Send attempt budget; 0 still makes a single attempt.
    pub retries: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5000,
            timeout_secs: 5.0,
            retries: 3,
        }
    }
}

impl NetworkConfig {
    /// The connect/read timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }

    /// `host:port` for the client side.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
