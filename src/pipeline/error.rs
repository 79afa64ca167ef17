use std::path::PathBuf;

use thiserror::Error;

use crate::data::DataError;
use crate::model::ModelError;
use crate::training::TrainingError;
use crate::tuning::TuningError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Tuning(#[from] TuningError),

    #[error(transparent)]
    Training(#[from] TrainingError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("failed to write report to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
