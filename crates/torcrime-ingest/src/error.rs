//! Error types for the ingest pipeline
//!
//! Three families of failure reach the caller unchanged: talking to the
//! open-data portal, turning a dump into rows, and writing to the store.
//! None of them are retried here.

use thiserror::Error;
use torcrime_common::CommonError;

/// Result type alias for ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    /// Transport-level HTTP failure (DNS, TLS, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The portal answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// CKAN wrapped its answer in `"success": false`
    #[error("CKAN rejected package_show for '{dataset}': {message}")]
    CkanRejected { dataset: String, message: String },

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    /// One or more projected columns are absent from a resource
    #[error("Resource '{resource}' is missing expected column(s): {}", missing.join(", "))]
    SchemaMismatch {
        resource: String,
        missing: Vec<String>,
    },

    /// A present cell could not be read as the column's type
    #[error("Resource '{resource}' row {row}: column {column} has invalid value {value:?}")]
    InvalidValue {
        resource: String,
        row: usize,
        column: &'static str,
        value: String,
    },

    /// A CSV row carrying more cells than the header names
    #[error("Resource '{resource}' row {row}: expected {expected} fields, saw {found}")]
    RaggedRow {
        resource: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A JSON payload that is neither a record list nor a CKAN dump
    #[error("Resource '{resource}' has an unsupported payload shape: {detail}")]
    UnsupportedPayload { resource: String, detail: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Common(#[from] CommonError),
}

impl IngestError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True for failures raised before any row reached the store
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::Status { .. }
                | Self::CkanRejected { .. }
                | Self::Json(_)
                | Self::Csv(_)
                | Self::SchemaMismatch { .. }
                | Self::InvalidValue { .. }
                | Self::RaggedRow { .. }
                | Self::UnsupportedPayload { .. }
        )
    }
}
