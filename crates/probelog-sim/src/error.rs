//! Error types for probelog-sim.

/// Result type for probelog-sim operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in probelog-sim.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The sensor has been stopped and cannot be read.
    #[error("Sensor {0} is inactive")]
    Inactive(String),
}
