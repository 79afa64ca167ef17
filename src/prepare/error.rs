use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("column '{name}' has {actual} rows, expected {expected}")]
    RaggedColumn {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate column '{name}'")]
    DuplicateColumn { name: String },

    #[error("column '{name}' not found")]
    MissingColumn { name: String },

    /// A text cell reached the numeric feature matrix.
    #[error("non-numeric value in column '{column}' at row {row}")]
    NonNumeric { column: String, row: usize },

    #[error("no column of the table is named by the mapping")]
    NoMatchingColumns,

    #[error("invalid threshold {threshold}: must be within [0, 1]")]
    InvalidThreshold { threshold: f64 },

    #[error("mapping entry '{key}' lists no features")]
    EmptyMappingEntry { key: String },

    #[error("mapping file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("geocoding failed: {reason}")]
    Geocode { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
