//! Error types shared by the clustering, classification and annotation stages.

use thiserror::Error;

use crate::parsing::ParseError;

#[derive(Error, Debug)]
pub enum PangenomeError {
    /// Bad cutoff ordering, conflicting policy flags, unknown strain names and the like.
    /// Always raised before the store is touched.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing cluster data at cutoff {cutoff}: no entry for '{identifier}'")]
    MissingClusterData { cutoff: u8, identifier: String },

    #[error("No gene matches the sequence of representative '{identifier}'")]
    RepresentativeNotFound { identifier: String },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Unsupported database schema: {found} (expected {expected})")]
    SchemaVersion { found: String, expected: String },

    #[error("Database error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PangenomeError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }
}
