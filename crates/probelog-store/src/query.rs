//! Range queries over live files and archives.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{Cursor, Read};
use std::path::PathBuf;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use zip::ZipArchive;

use probelog_types::Reading;

use crate::config::StoreConfig;
use crate::error::{Error, Result};

enum Source {
    /// A plain CSV file in the live log directory.
    Csv(PathBuf),
    /// A zip archive; its entries are decompressed when reached.
    Zip(PathBuf),
    /// Decompressed archive entry contents.
    Memory(Cursor<Vec<u8>>),
}

type Records = csv::StringRecordsIntoIter<Box<dyn Read>>;

/// Lazy, non-restartable stream of readings in a time range.
///
/// Files are discovered when the query is created but opened only as the
/// iterator reaches them. The order in which files are visited follows the
/// directory listing and is unspecified; rows within one file come back in
/// append order.
pub struct Query {
    start: OffsetDateTime,
    end: OffsetDateTime,
    sensor_id: Option<String>,
    sources: VecDeque<Source>,
    current: Option<Records>,
}

impl Query {
    pub(crate) fn scan(
        config: &StoreConfig,
        start: OffsetDateTime,
        end: OffsetDateTime,
        sensor_id: Option<&str>,
    ) -> Result<Self> {
        let mut sources = VecDeque::new();

        for entry in fs::read_dir(&config.log_dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == "csv") {
                sources.push_back(Source::Csv(path));
            }
        }
        for entry in fs::read_dir(config.archive_dir())? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == "zip") {
                sources.push_back(Source::Zip(path));
            }
        }

        Ok(Self {
            start,
            end,
            sensor_id: sensor_id.map(str::to_string),
            sources,
            current: None,
        })
    }

    /// True when the reading falls inside the query window and filter.
    fn matches(&self, reading: &Reading) -> bool {
        reading.timestamp >= self.start
            && reading.timestamp <= self.end
            && self
                .sensor_id
                .as_deref()
                .is_none_or(|id| reading.sensor_id == id)
    }

    /// Open the next source, expanding zip archives into in-memory entries.
    fn advance(&mut self) -> Result<bool> {
        loop {
            match self.sources.pop_front() {
                None => return Ok(false),
                Some(Source::Csv(path)) => {
                    let reader: Box<dyn Read> = Box::new(File::open(&path)?);
                    self.current = Some(csv::Reader::from_reader(reader).into_records());
                    return Ok(true);
                }
                Some(Source::Zip(path)) => {
                    let mut archive = ZipArchive::new(File::open(&path)?)?;
                    // Entries queue up ahead of the remaining files, in
                    // archive order.
                    for index in (0..archive.len()).rev() {
                        let mut entry = archive.by_index(index)?;
                        let mut contents = Vec::with_capacity(entry.size() as usize);
                        entry.read_to_end(&mut contents)?;
                        self.sources.push_front(Source::Memory(Cursor::new(contents)));
                    }
                }
                Some(Source::Memory(cursor)) => {
                    let reader: Box<dyn Read> = Box::new(cursor);
                    self.current = Some(csv::Reader::from_reader(reader).into_records());
                    return Ok(true);
                }
            }
        }
    }
}

impl Iterator for Query {
    type Item = Result<Reading>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // Pull one record at a time so the borrow on `current` ends
            // before the filter check reads the rest of `self`.
            while let Some(record) = self.current.as_mut().and_then(Iterator::next) {
                let reading = match record.map_err(Error::from).and_then(parse_row) {
                    Ok(reading) => reading,
                    Err(e) => return Some(Err(e)),
                };
                if self.matches(&reading) {
                    return Some(Ok(reading));
                }
            }
            self.current = None;

            match self.advance() {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Parse one on-disk row back into a reading.
fn parse_row(record: csv::StringRecord) -> Result<Reading> {
    let field = |i: usize| {
        record
            .get(i)
            .ok_or_else(|| Error::MalformedRow(format!("row has {} fields", record.len())))
    };

    let timestamp = OffsetDateTime::parse(field(0)?, &Rfc3339)
        .map_err(|e| Error::MalformedRow(format!("bad timestamp: {e}")))?;
    let sensor_id = field(1)?.to_string();
    let value: f64 = field(2)?
        .parse()
        .map_err(|e| Error::MalformedRow(format!("bad value: {e}")))?;
    let unit = field(3)?.to_string();

    Ok(Reading::new(sensor_id, timestamp, value, unit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LogStore;
    use time::Duration;
    use time::macros::datetime;

    const T0: OffsetDateTime = datetime!(2025-06-01 00:00:00 UTC);

    fn reading(id: &str, offset_minutes: i64, value: f64) -> Reading {
        Reading::new(id, T0 + Duration::minutes(offset_minutes), value, "x")
    }

    fn started(config: StoreConfig) -> LogStore {
        let mut store = LogStore::open(config).unwrap();
        store.start().unwrap();
        store
    }

    fn config(dir: &std::path::Path) -> StoreConfig {
        StoreConfig {
            log_dir: dir.to_path_buf(),
            buffer_size: 2,
            rotate_after_lines: 1000,
            ..Default::default()
        }
    }

    fn collect(query: Query) -> Vec<Reading> {
        query.map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_buffered_rows_invisible_until_flushed() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = started(config(dir.path()));

        store.record(reading("T1", 0, 1.0)).unwrap();
        store.record(reading("T1", 1, 2.0)).unwrap();
        store.record(reading("T1", 2, 3.0)).unwrap();

        let visible = collect(store.query(T0, T0 + Duration::hours(1), None).unwrap());
        assert_eq!(visible.len(), 2);

        store.flush().unwrap();
        let visible = collect(store.query(T0, T0 + Duration::hours(1), None).unwrap());
        assert_eq!(visible.len(), 3);
    }

    #[test]
    fn test_query_merges_live_and_archived_rows() {
        let dir = tempfile::tempdir().unwrap();

        // First two rows rotate into an archive.
        let mut writer = started(StoreConfig {
            rotate_after_lines: 2,
            ..config(dir.path())
        });
        writer.record(reading("T1", 0, 0.0)).unwrap();
        writer.record(reading("T1", 1, 1.0)).unwrap();
        drop(writer);

        // The next two land in a fresh live file.
        let mut store = started(config(dir.path()));
        store.record(reading("T1", 2, 2.0)).unwrap();
        store.record(reading("T1", 3, 3.0)).unwrap();
        assert_eq!(
            fs::read_dir(store.config().archive_dir()).unwrap().count(),
            1
        );

        let mut values: Vec<f64> = collect(store.query(T0, T0 + Duration::hours(1), None).unwrap())
            .into_iter()
            .map(|r| r.value)
            .collect();
        values.sort_by(f64::total_cmp);
        assert_eq!(values, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_sensor_filter_spans_live_and_archived_files() {
        let dir = tempfile::tempdir().unwrap();

        let mut writer = started(StoreConfig {
            rotate_after_lines: 2,
            ..config(dir.path())
        });
        writer.record(reading("T1", 0, 0.0)).unwrap();
        writer.record(reading("H1", 1, 1.0)).unwrap();
        drop(writer);

        let mut store = started(config(dir.path()));
        store.record(reading("T1", 2, 2.0)).unwrap();
        store.record(reading("H1", 3, 3.0)).unwrap();

        let hits = collect(
            store
                .query(T0, T0 + Duration::hours(1), Some("T1"))
                .unwrap(),
        );
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|r| r.sensor_id == "T1"));
    }

    #[test]
    fn test_query_skips_archive_staging_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = started(config(dir.path()));
        store.record(reading("T1", 0, 1.0)).unwrap();
        store.record(reading("T1", 1, 2.0)).unwrap();

        // A crash between container write and rename leaves a .zip.tmp
        // behind; it must not be opened as an archive.
        fs::write(
            store.config().archive_dir().join("sensors.csv.zip.tmp"),
            b"garbage",
        )
        .unwrap();

        let hits = collect(store.query(T0, T0 + Duration::hours(1), None).unwrap());
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_query_interval_is_inclusive() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = started(config(dir.path()));

        store.record(reading("T1", 0, 1.0)).unwrap();
        store.record(reading("T1", 10, 2.0)).unwrap();
        store.record(reading("T1", 20, 3.0)).unwrap();
        store.flush().unwrap();

        let hits = collect(
            store
                .query(T0, T0 + Duration::minutes(10), None)
                .unwrap(),
        );
        assert_eq!(hits.len(), 2);

        let hits = collect(
            store
                .query(T0 + Duration::minutes(10), T0 + Duration::minutes(10), None)
                .unwrap(),
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].value, 2.0);
    }

    #[test]
    fn test_query_sensor_filter() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = started(config(dir.path()));

        store.record(reading("T1", 0, 1.0)).unwrap();
        store.record(reading("H1", 1, 2.0)).unwrap();
        store.record(reading("T1", 2, 3.0)).unwrap();
        store.flush().unwrap();

        let hits = collect(
            store
                .query(T0, T0 + Duration::hours(1), Some("T1"))
                .unwrap(),
        );
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|r| r.sensor_id == "T1"));
    }

    #[test]
    fn test_rows_preserve_append_order_within_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = started(config(dir.path()));

        store.record(reading("T1", 5, 1.0)).unwrap();
        store.record(reading("T1", 0, 2.0)).unwrap();
        store.flush().unwrap();

        let hits = collect(store.query(T0, T0 + Duration::hours(1), None).unwrap());
        // Append order, not timestamp order.
        assert_eq!(hits[0].value, 1.0);
        assert_eq!(hits[1].value, 2.0);
    }
}
