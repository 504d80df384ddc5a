//! # Schema Guard
//!
//! Startup reconciliation between the compiled-in record layout and the
//! records already on disk. Runs once, before any other log access, and is
//! the only component allowed to delete the log file.
//!
//! A schema mismatch is not an error: it is an expected condition resolved
//! by wiping the log and reinitializing the metadata. The guard never
//! inspects record contents — only the `(version, size)` tuple.

use tracing::{info, warn};

use crate::error::Result;
use crate::store::log::RecordLog;
use crate::store::meta::{MetaStore, SchemaMeta};

/// Reconciles persisted schema metadata with the compiled-in layout
#[derive(Debug)]
pub struct SchemaGuard<'a> {
    log: &'a RecordLog,
    meta: &'a MetaStore,
}

impl<'a> SchemaGuard<'a> {
    pub fn new(log: &'a RecordLog, meta: &'a MetaStore) -> Self {
        Self { log, meta }
    }

    /// Reconcile the on-disk layout identity with the current build
    ///
    /// - First boot (no metadata): persist the current values, keep the log.
    /// - Metadata matches: no-op.
    /// - Metadata differs: wipe the log file, then persist the current
    ///   values.
    ///
    /// The wipe happens before the metadata update, so a crash between the
    /// two steps re-runs as a (now empty) mismatch wipe — re-running
    /// `reconcile` always converges to the same end state.
    ///
    /// # Errors
    ///
    /// Only an underlying storage failure during reconciliation is an
    /// error; the mismatch itself is not.
    pub fn reconcile(&self) -> Result<()> {
        let current = SchemaMeta::current();

        match self.meta.load()? {
            None => {
                info!(
                    "First boot: initializing schema metadata (version={}, size={})",
                    current.record_version, current.record_size_bytes
                );
                self.meta.store(&current)
            }
            Some(persisted) if persisted == current => Ok(()),
            Some(persisted) => {
                warn!(
                    "Record layout changed (persisted version={} size={}, current version={} size={}): wiping {} records",
                    persisted.record_version,
                    persisted.record_size_bytes,
                    current.record_version,
                    current.record_size_bytes,
                    self.log.count()
                );
                self.log.wipe()?;
                self.meta.store(&current)
            }
        }
    }
}
