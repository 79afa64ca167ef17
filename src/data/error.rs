use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("shape mismatch: expected feature length {expected}, got {actual} (pair {index})")]
    ShapeMismatch {
        expected: usize,
        actual: usize,
        index: usize,
    },

    #[error("non-finite feature value {value} at pair {index}")]
    NonFiniteFeature { value: f32, index: usize },

    #[error("invalid label {label} at pair {index}: labels must be 0 or 1")]
    InvalidLabel { label: u8, index: usize },

    #[error("pairs and labels differ in length: {pairs} pairs, {labels} labels")]
    LengthMismatch { pairs: usize, labels: usize },

    #[error("dataset is empty")]
    Empty,

    #[error("invalid validation fraction {fraction}: must be in (0, 1)")]
    InvalidFraction { fraction: f64 },

    #[error("dataset file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),
}
