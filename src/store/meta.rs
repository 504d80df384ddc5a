//! # Schema Metadata
//!
//! Crash-safe persistence of the record layout identity, kept in a separate
//! small key/value document rather than in the log file itself.
//!
//! Invariant: whenever a log file with at least one record exists, the
//! persisted `(record_version, record_size_bytes)` equal the layout that
//! produced it. The schema guard is the only writer after first boot.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PackmonError, Result};
use crate::record::{RECORD_SIZE_BYTES, RECORD_VERSION};

/// Persisted identity of the record layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMeta {
    /// Record layout version
    pub record_version: u32,

    /// Declared size of one encoded record in bytes
    pub record_size_bytes: u32,
}

impl SchemaMeta {
    /// The metadata matching the compiled-in record layout
    pub fn current() -> Self {
        Self {
            record_version: RECORD_VERSION,
            record_size_bytes: RECORD_SIZE_BYTES as u32,
        }
    }
}

/// Get/set/commit-style store for [`SchemaMeta`]
#[derive(Debug, Clone)]
pub struct MetaStore {
    path: PathBuf,
}

impl MetaStore {
    /// Create a store handle for the given document path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing metadata document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted metadata
    ///
    /// # Returns
    ///
    /// * `Ok(None)` if the document does not exist yet (first boot)
    ///
    /// # Errors
    ///
    /// Returns an error on read failure or a malformed document.
    pub fn load(&self) -> Result<Option<SchemaMeta>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PackmonError::Io(e)),
        };

        let meta: SchemaMeta = serde_json::from_slice(&bytes)?;
        Ok(Some(meta))
    }

    /// Persist the given metadata, committing atomically
    ///
    /// Writes a temp file in the same directory, fsyncs it, then renames it
    /// over the document so a crash mid-write never leaves a torn document.
    pub fn store(&self, meta: &SchemaMeta) -> Result<()> {
        let tmp_path = self.path.with_extension("tmp");

        let mut tmp = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        tmp.write_all(&serde_json::to_vec(meta)?)?;
        tmp.sync_all()?;
        drop(tmp);

        std::fs::rename(&tmp_path, &self.path)?;

        // Make the rename itself durable
        if let Some(dir) = self.path.parent() {
            if let Ok(dir_file) = File::open(dir) {
                let _ = dir_file.sync_all();
            }
        }

        debug!(
            "Persisted schema metadata version={} size={}",
            meta.record_version, meta.record_size_bytes
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, MetaStore) {
        let dir = TempDir::new().unwrap();
        let store = MetaStore::new(dir.path().join("schema_meta.json"));
        (dir, store)
    }

    #[test]
    fn test_current_matches_compiled_constants() {
        let meta = SchemaMeta::current();
        assert_eq!(meta.record_version, RECORD_VERSION);
        assert_eq!(meta.record_size_bytes, RECORD_SIZE_BYTES as u32);
    }

    #[test]
    fn test_load_missing_is_none() {
        let (_dir, store) = temp_store();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_store_then_load_round_trip() {
        let (_dir, store) = temp_store();

        let meta = SchemaMeta {
            record_version: 7,
            record_size_bytes: 64,
        };
        store.store(&meta).unwrap();
        assert_eq!(store.load().unwrap(), Some(meta));
    }

    #[test]
    fn test_store_overwrites_previous_value() {
        let (_dir, store) = temp_store();

        store
            .store(&SchemaMeta {
                record_version: 1,
                record_size_bytes: 49,
            })
            .unwrap();
        store.store(&SchemaMeta::current()).unwrap();

        assert_eq!(store.load().unwrap(), Some(SchemaMeta::current()));
    }

    #[test]
    fn test_load_malformed_document_is_error() {
        let (_dir, store) = temp_store();

        std::fs::write(store.path(), b"not json").unwrap();
        assert!(store.load().is_err());
    }

    #[test]
    fn test_store_leaves_no_temp_file() {
        let (dir, store) = temp_store();

        store.store(&SchemaMeta::current()).unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|name| name.to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
