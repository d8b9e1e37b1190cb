//! Error types for the KQL language service

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading the schema catalog
///
/// Request entry points (completion, hover, diagnostics) never return these;
/// they degrade to empty results instead.
#[derive(Debug, Error)]
pub enum Error {
    /// No schema catalog could be located
    #[error("Schema catalog not found. Searched paths: {searched_paths:?}. Set KQL_SCHEMA_PATH to specify location.")]
    SchemaNotFound { searched_paths: Vec<PathBuf> },

    /// The schema catalog exists but could not be read or parsed
    #[error("Failed to load schema catalog from {path}: {message}")]
    SchemaLoadFailed { path: PathBuf, message: String },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Create a schema load failure error
    #[must_use]
    pub fn schema_load_failed(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::SchemaLoadFailed {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
