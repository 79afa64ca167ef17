use thiserror::Error;

use crate::model::ModelError;

#[derive(Debug, Error)]
pub enum TrainingError {
    /// Loss, distances or weights became NaN or infinite.
    #[error("training diverged at epoch {epoch}, batch {batch}: {reason}")]
    Diverged {
        epoch: usize,
        batch: usize,
        reason: String,
    },

    #[error("training cancelled after {completed_epochs} completed epochs")]
    Cancelled { completed_epochs: usize },

    #[error("{split} set is empty")]
    EmptyDataset { split: &'static str },

    #[error("invalid trainer configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl From<candle_core::Error> for TrainingError {
    fn from(err: candle_core::Error) -> Self {
        TrainingError::Model(ModelError::from(err))
    }
}

impl TrainingError {
    /// Returns `true` for [`TrainingError::Diverged`].
    pub fn is_diverged(&self) -> bool {
        matches!(self, TrainingError::Diverged { .. })
    }
}

pub type TrainingResult<T> = Result<T, TrainingError>;
