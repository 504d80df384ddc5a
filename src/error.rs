//! # Error Types
//!
//! Custom error types for Packmon using `thiserror`.

use thiserror::Error;

/// Main error type for Packmon
#[derive(Debug, Error)]
pub enum PackmonError {
    /// Record wire-codec errors
    #[error("Record codec error: {0}")]
    RecordCodec(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration validation errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Schema metadata (de)serialization errors
    #[error("Schema metadata error: {0}")]
    SchemaMeta(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A log append wrote fewer bytes than one full record
    #[error("Short write to record log: wrote {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },
}

/// Result type alias for Packmon
pub type Result<T> = std::result::Result<T, PackmonError>;
