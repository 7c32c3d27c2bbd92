//! Rotating, archived, range-queryable log store for sensor readings.
//!
//! Readings are buffered in memory, appended to a CSV file under the
//! configured log directory, and the active file is rotated on age, size,
//! or row-count triggers. Rotated files are compressed into a sibling
//! `archive` directory as single-entry zip containers and pruned once they
//! fall outside the retention window. [`LogStore::query`] transparently
//! merges live files and archives into one lazy stream of readings.
//!
//! # Example
//!
//! ```no_run
//! use probelog_store::{LogStore, StoreConfig};
//! use probelog_types::Reading;
//!
//! let mut store = LogStore::open(StoreConfig::default())?;
//! store.start()?;
//! store.record(Reading::now("T1", 21.5, "°C"))?;
//! store.stop()?;
//! # Ok::<(), probelog_store::Error>(())
//! ```

mod config;
mod error;
mod pattern;
mod query;
mod shared;
mod store;

pub use config::StoreConfig;
pub use error::{Error, Result};
pub use query::Query;
pub use shared::SharedLogStore;
pub use store::{CSV_HEADER, LogStore};
