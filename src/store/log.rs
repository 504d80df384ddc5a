//! # Record Log
//!
//! Append-only binary store for telemetry records.
//!
//! The log file is a raw concatenation of fixed-size encoded records with no
//! header, index, or checksum; record `i` (0-based, oldest first) lives at
//! byte offset `i * RECORD_SIZE_BYTES`. The file is created implicitly by
//! the first append and truncated only by the schema guard's wipe — there is
//! no in-place update or delete.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{PackmonError, Result};
use crate::record::{Record, RECORD_SIZE_BYTES};

/// Append-only record log backed by a single file
#[derive(Debug, Clone)]
pub struct RecordLog {
    /// Path of the backing log file
    path: PathBuf,
}

impl RecordLog {
    /// Create a log handle for the given file path
    ///
    /// The file itself is created lazily by the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record to the log
    ///
    /// Writes exactly [`RECORD_SIZE_BYTES`] bytes and flushes to durable
    /// storage before reporting success; power loss is a realistic failure
    /// mode for this class of device. A short write is reported as failure
    /// and the caller must not assume the record was persisted.
    ///
    /// # Errors
    ///
    /// Returns an error on open/write/sync failure or a short write.
    pub fn append(&self, record: &Record) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                warn!("Failed to open {} for append: {}", self.path.display(), e);
                PackmonError::Io(e)
            })?;

        let encoded = record.encode();
        let written = file.write(&encoded)?;
        if written != RECORD_SIZE_BYTES {
            warn!(
                "Short write to {}: {} of {} bytes",
                self.path.display(),
                written,
                RECORD_SIZE_BYTES
            );
            return Err(PackmonError::ShortWrite {
                written,
                expected: RECORD_SIZE_BYTES,
            });
        }

        file.sync_all()?;
        debug!("Appended record seq={} ({} bytes)", record.seq, RECORD_SIZE_BYTES);
        Ok(())
    }

    /// Number of complete records in the log
    ///
    /// Derived from file size ÷ record size. A missing file, a stat failure,
    /// or a file smaller than one record all count as 0 — callers treat 0
    /// uniformly as "nothing to read" without distinguishing empty from
    /// absent. A trailing partial record is not counted.
    pub fn count(&self) -> u64 {
        match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() / RECORD_SIZE_BYTES as u64,
            Err(_) => 0,
        }
    }

    /// Read the record at the given 0-based index
    ///
    /// # Returns
    ///
    /// * `Ok(Some(record))` for `0 <= index < count()`
    /// * `Ok(None)` for an out-of-range index or a short read — the normal
    ///   end-of-backlog signal, defensive against concurrent truncation
    ///
    /// # Errors
    ///
    /// Returns an error only for underlying open/seek failures on an
    /// existing file; a missing file reads as `None`.
    pub fn read(&self, index: u64) -> Result<Option<Record>> {
        if index >= self.count() {
            return Ok(None);
        }

        let mut file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PackmonError::Io(e)),
        };

        file.seek(SeekFrom::Start(index * RECORD_SIZE_BYTES as u64))?;

        let mut buf = [0u8; RECORD_SIZE_BYTES];
        let mut filled = 0;
        while filled < RECORD_SIZE_BYTES {
            match file.read(&mut buf[filled..]) {
                Ok(0) => {
                    warn!(
                        "Short read at index {}: {} of {} bytes",
                        index, filled, RECORD_SIZE_BYTES
                    );
                    return Ok(None);
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(PackmonError::Io(e)),
            }
        }

        Ok(Some(Record::decode(&buf)?))
    }

    /// Delete the backing log file
    ///
    /// Only the schema guard calls this; a missing file is success.
    pub(crate) fn wipe(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Wiped record log {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PackmonError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record_with(timestamp_s: u32, soc: u8, seq: u32) -> Record {
        Record {
            timestamp_s,
            soc,
            seq,
            ..Record::default()
        }
    }

    fn temp_log() -> (TempDir, RecordLog) {
        let dir = TempDir::new().unwrap();
        let log = RecordLog::new(dir.path().join("battery.bin"));
        (dir, log)
    }

    #[test]
    fn test_count_missing_file_is_zero() {
        let (_dir, log) = temp_log();
        assert_eq!(log.count(), 0);
    }

    #[test]
    fn test_append_increments_count_and_file_size() {
        let (_dir, log) = temp_log();

        for i in 0..4 {
            log.append(&record_with(1000 + i, 50, i)).unwrap();
            assert_eq!(log.count(), (i + 1) as u64);
        }

        let size = std::fs::metadata(log.path()).unwrap().len();
        assert_eq!(size, 4 * RECORD_SIZE_BYTES as u64);
    }

    #[test]
    fn test_read_round_trip() {
        let (_dir, log) = temp_log();

        let records: Vec<Record> = (0..5).map(|i| record_with(2000 + i, 40 + i as u8, i)).collect();
        for record in &records {
            log.append(record).unwrap();
        }

        for (i, expected) in records.iter().enumerate() {
            let read = log.read(i as u64).unwrap().unwrap();
            assert_eq!(&read, expected);
        }
    }

    #[test]
    fn test_read_out_of_range_is_none() {
        let (_dir, log) = temp_log();

        // Empty log
        assert!(log.read(0).unwrap().is_none());
        assert!(log.read(u64::MAX).unwrap().is_none());

        log.append(&record_with(1, 1, 1)).unwrap();
        assert!(log.read(0).unwrap().is_some());
        assert!(log.read(1).unwrap().is_none());
    }

    #[test]
    fn test_trailing_partial_record_not_counted() {
        let (_dir, log) = temp_log();

        log.append(&record_with(1, 1, 1)).unwrap();

        // Simulate a torn write: a trailing fragment of a second record
        let mut file = OpenOptions::new().append(true).open(log.path()).unwrap();
        file.write_all(&[0xAB; 10]).unwrap();
        drop(file);

        assert_eq!(log.count(), 1);
        assert!(log.read(0).unwrap().is_some());
        assert!(log.read(1).unwrap().is_none());
    }

    #[test]
    fn test_file_smaller_than_one_record_is_empty() {
        let (_dir, log) = temp_log();

        std::fs::write(log.path(), [0u8; RECORD_SIZE_BYTES - 1]).unwrap();
        assert_eq!(log.count(), 0);
        assert!(log.read(0).unwrap().is_none());
    }

    #[test]
    fn test_wipe_removes_file_and_is_idempotent() {
        let (_dir, log) = temp_log();

        log.append(&record_with(1, 1, 1)).unwrap();
        assert_eq!(log.count(), 1);

        log.wipe().unwrap();
        assert_eq!(log.count(), 0);
        assert!(!log.path().exists());

        // Wiping a missing file is success
        log.wipe().unwrap();
    }

    #[test]
    fn test_scenario_five_records() {
        let (_dir, log) = temp_log();

        let socs = [50u8, 60, 70, 80, 90];
        for (i, &soc) in socs.iter().enumerate() {
            log.append(&record_with(1000 + i as u32, soc, i as u32)).unwrap();
        }

        assert_eq!(log.count(), 5);
        assert_eq!(log.read(0).unwrap().unwrap().soc, 50);
        assert_eq!(log.read(4).unwrap().unwrap().soc, 90);
        assert!(log.read(5).unwrap().is_none());
    }
}
