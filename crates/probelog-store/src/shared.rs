//! Mutex-guarded store handle for concurrent writers.

use std::sync::{Arc, Mutex, PoisonError};

use time::OffsetDateTime;

use probelog_types::Reading;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::query::Query;
use crate::store::LogStore;

/// A cloneable, lock-guarded handle to one [`LogStore`].
///
/// The store itself is single-writer; this wrapper serializes every
/// mutation behind one mutex so the same store can back several connection
/// handlers and a reading channel at once. All methods take `&self`.
#[derive(Clone)]
pub struct SharedLogStore {
    inner: Arc<Mutex<LogStore>>,
}

impl SharedLogStore {
    /// Open and start a store, returning the shared handle.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let mut store = LogStore::open(config)?;
        store.start()?;
        Ok(Self {
            inner: Arc::new(Mutex::new(store)),
        })
    }

    /// Wrap an already-started store.
    pub fn new(store: LogStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Run a closure against the locked store.
    pub fn with<R>(&self, f: impl FnOnce(&mut LogStore) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Append a reading. See [`LogStore::record`].
    pub fn record(&self, reading: Reading) -> Result<()> {
        self.with(|store| store.record(reading))
    }

    /// Force out buffered rows. See [`LogStore::flush`].
    pub fn flush(&self) -> Result<()> {
        self.with(LogStore::flush)
    }

    /// Flush, close, and run the final rotation check. See
    /// [`LogStore::stop`].
    pub fn stop(&self) -> Result<()> {
        self.with(LogStore::stop)
    }

    /// Range query. See [`LogStore::query`].
    pub fn query(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
        sensor_id: Option<&str>,
    ) -> Result<Query> {
        self.with(|store| store.query(start, end, sensor_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use time::Duration;

    #[test]
    fn test_concurrent_recorders_serialize() {
        let dir = tempfile::tempdir().unwrap();
        let store = SharedLogStore::open(StoreConfig {
            log_dir: dir.path().to_path_buf(),
            buffer_size: 1,
            rotate_after_lines: 10_000,
            ..Default::default()
        })
        .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        store
                            .record(Reading::now(format!("W{worker}"), i as f64, "n"))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let now = OffsetDateTime::now_utc();
        let rows = store
            .query(now - Duration::hours(1), now + Duration::hours(1), None)
            .unwrap()
            .count();
        assert_eq!(rows, 100);
    }
}
