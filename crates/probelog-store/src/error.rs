//! Error types for probelog-store.

use std::path::PathBuf;

/// Result type for probelog-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in probelog-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to create the log or archive directory.
    #[error("Failed to create log directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// CSV read or write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Zip archive error.
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The filename pattern used a directive the store does not support.
    #[error("Unsupported filename pattern directive %{0}")]
    Pattern(char),

    /// Failed to render a timestamp into its on-disk form.
    #[error("Failed to format timestamp: {0}")]
    TimestampFormat(#[from] time::error::Format),

    /// The active file path has no usable file name component.
    #[error("Active path has no usable file name: {0}")]
    ActivePath(PathBuf),

    /// A log row could not be parsed back into a reading.
    #[error("Malformed log row: {0}")]
    MalformedRow(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
