//! # Persistent Store Module
//!
//! Durable retention of telemetry records on local storage.
//!
//! This module handles:
//! - Append-only record log with fixed-size binary records (`log`)
//! - Crash-safe schema metadata in a separate key/value document (`meta`)
//! - Startup reconciliation of layout version vs. persisted data (`guard`)
//!
//! The record log and schema metadata never touch the transport; they are
//! consumed only by the producer loop and the startup sequence.

pub mod guard;
pub mod log;
pub mod meta;

pub use guard::SchemaGuard;
pub use log::RecordLog;
pub use meta::{MetaStore, SchemaMeta};
