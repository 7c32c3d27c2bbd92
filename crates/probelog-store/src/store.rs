//! Main log store implementation.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info, warn};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use probelog_types::Reading;

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::pattern;
use crate::query::Query;

/// Header row written once when an active file is created.
pub const CSV_HEADER: [&str; 4] = ["timestamp", "sensor_id", "value", "unit"];

/// Buffered, rotating, zip-archiving sink for [`Reading`]s.
///
/// A store owns at most one active file at a time. Readings accumulate in
/// an in-memory buffer and are written out in arrival order on flush; every
/// flush is followed by a rotation check against the age, size, and
/// row-count triggers in [`StoreConfig`].
pub struct LogStore {
    config: StoreConfig,
    buffer: Vec<Reading>,
    writer: Option<csv::Writer<File>>,
    active_path: Option<PathBuf>,
    last_rotation: OffsetDateTime,
    rows_written: u64,
}

impl LogStore {
    /// Create a store, ensuring the log and archive directories exist.
    ///
    /// Safe to call when the directories are already present. A directory
    /// that cannot be created is fatal: the store cannot operate.
    pub fn open(config: StoreConfig) -> Result<Self> {
        for dir in [config.log_dir.clone(), config.archive_dir()] {
            fs::create_dir_all(&dir).map_err(|e| Error::CreateDirectory {
                path: dir.clone(),
                source: e,
            })?;
        }

        Ok(Self {
            config,
            buffer: Vec::new(),
            writer: None,
            active_path: None,
            last_rotation: OffsetDateTime::now_utc(),
            rows_written: 0,
        })
    }

    /// Open the active file for append, creating it (and its header row)
    /// if needed.
    ///
    /// The file name is the current time rendered through
    /// `filename_pattern`. Resets the rotation anchor to now and recomputes
    /// the row counter from what is already on disk.
    pub fn start(&mut self) -> Result<()> {
        let now = OffsetDateTime::now_utc();
        let filename = pattern::render(&self.config.filename_pattern, now)?;
        let path = self.config.log_dir.join(filename);
        let existed = path.is_file();

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::Writer::from_writer(file);

        if !existed {
            writer.write_record(CSV_HEADER)?;
            writer.flush()?;
        }

        self.rows_written = count_data_rows(&path)?;
        self.last_rotation = now;
        self.active_path = Some(path.clone());
        self.writer = Some(writer);

        info!(
            "Active log file {} ({} existing rows)",
            path.display(),
            self.rows_written
        );
        Ok(())
    }

    /// Append a reading to the buffer, flushing and checking rotation when
    /// a flush condition is met.
    ///
    /// Two independent flush conditions are evaluated in order: the buffer
    /// reaching `buffer_size`, or its length being a multiple of 10. The
    /// second condition only ever fires when `buffer_size > 10`; this
    /// mirrors the historical behavior and is kept deliberately.
    pub fn record(&mut self, reading: Reading) -> Result<()> {
        self.buffer.push(reading);

        if self.buffer.len() >= self.config.buffer_size {
            self.flush()?;
            self.rotate_if_needed()?;
        } else if self.buffer.len() % 10 == 0 {
            self.flush()?;
            self.rotate_if_needed()?;
        }

        Ok(())
    }

    /// Write all buffered rows to the active file in arrival order and
    /// clear the buffer. No-op when the buffer is empty or no file is open.
    pub fn flush(&mut self) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        if self.buffer.is_empty() {
            return Ok(());
        }

        for reading in &self.buffer {
            writer.write_record([
                reading.timestamp.format(&Rfc3339)?,
                reading.sensor_id.clone(),
                format!("{:.2}", reading.value),
                reading.unit.clone(),
            ])?;
        }

        self.rows_written += self.buffer.len() as u64;
        debug!("Flushed {} rows", self.buffer.len());
        self.buffer.clear();
        writer.flush()?;

        Ok(())
    }

    /// Flush, close the active file, and run one final rotation check.
    ///
    /// A store that accumulated enough rows without hitting a
    /// flush-triggered check still rotates on the way out. Note the final
    /// rotation, if taken, reopens a fresh active file, so the store stays
    /// usable afterwards.
    pub fn stop(&mut self) -> Result<()> {
        self.flush()?;
        self.writer = None;
        self.rotate_if_needed()
    }

    /// Number of data rows written to the active file since it was opened.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Number of readings buffered but not yet persisted.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Path of the current active file, once [`start`](Self::start) ran.
    pub fn active_path(&self) -> Option<&PathBuf> {
        self.active_path.as_ref()
    }

    /// The store's configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Lazily stream readings whose timestamp lies in `[start, end]`
    /// (inclusive), optionally filtered to one sensor id.
    ///
    /// The result merges every `.csv` file in the log directory (flushed
    /// rows of the active file included; buffered rows are invisible until
    /// flushed) with the decompressed contents of every `.zip` archive.
    /// Enumeration order across files is unspecified; within one file rows
    /// stream in append order.
    pub fn query(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
        sensor_id: Option<&str>,
    ) -> Result<Query> {
        Query::scan(&self.config, start, end, sensor_id)
    }

    fn should_rotate(&self) -> Result<bool> {
        let now = OffsetDateTime::now_utc();
        let elapsed_hours = (now - self.last_rotation).as_seconds_f64() / 3600.0;
        if elapsed_hours >= self.config.rotate_every_hours {
            return Ok(true);
        }

        if let Some(path) = &self.active_path
            && path.is_file()
        {
            let size_mb = fs::metadata(path)?.len() as f64 / (1024.0 * 1024.0);
            if size_mb >= self.config.max_size_mb {
                return Ok(true);
            }
        }

        Ok(self.rows_written >= self.config.rotate_after_lines)
    }

    fn rotate_if_needed(&mut self) -> Result<()> {
        if !self.should_rotate()? {
            return Ok(());
        }

        // Release the append handle before touching the file on disk.
        self.writer = None;

        // A failed archive write aborts this rotation step: the original
        // file stays on disk for a later attempt.
        match self.archive_active() {
            Ok(Some(archive)) => info!("Archived rotated file to {}", archive.display()),
            Ok(None) => {}
            Err(e) => warn!("Archive step failed, keeping un-rotated file: {e}"),
        }

        if let Err(e) = self.prune_archives(OffsetDateTime::now_utc()) {
            warn!("Archive pruning failed: {e}");
        }

        self.start()
    }

    /// Compress the active file into the archive directory, deleting the
    /// original only after the archive write succeeded.
    fn archive_active(&self) -> Result<Option<PathBuf>> {
        let Some(path) = self.active_path.as_ref().filter(|p| p.is_file()) else {
            return Ok(None);
        };
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::ActivePath(path.clone()))?;

        // Build the container under a temporary name so a failure partway
        // through never leaves a truncated .zip for queries to trip over.
        let archive_path = self.config.archive_dir().join(format!("{name}.zip"));
        let staging_path = self.config.archive_dir().join(format!("{name}.zip.tmp"));
        let mut zip = ZipWriter::new(File::create(&staging_path)?);
        zip.start_file(name, SimpleFileOptions::default())?;
        io::copy(&mut File::open(path)?, &mut zip)?;
        zip.finish()?;
        fs::rename(&staging_path, &archive_path)?;

        fs::remove_file(path)?;
        Ok(Some(archive_path))
    }

    /// Delete archives whose last-modified time is older than the
    /// retention window, measured in whole days.
    fn prune_archives(&self, now: OffsetDateTime) -> Result<()> {
        for entry in fs::read_dir(self.config.archive_dir())? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let modified = OffsetDateTime::from(metadata.modified()?);
            if (now - modified).whole_days() > self.config.retention_days {
                debug!("Pruning expired archive {}", entry.path().display());
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn prune_archives_at(&self, now: OffsetDateTime) -> Result<()> {
        self.prune_archives(now)
    }
}

/// Count on-disk data rows: existing lines minus the header, or 0 for a
/// missing file.
fn count_data_rows(path: &std::path::Path) -> Result<u64> {
    if !path.is_file() {
        return Ok(0);
    }
    let lines = BufReader::new(File::open(path)?).lines().count() as u64;
    Ok(lines.saturating_sub(1))
}
