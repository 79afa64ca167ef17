use thiserror::Error;

use crate::model::ModelError;

#[derive(Debug, Error)]
pub enum TuningError {
    /// No configuration could be evaluated: the space is empty or every candidate of a
    /// bracket failed.
    #[error("configuration exhausted: {reason}")]
    ConfigurationExhausted { reason: String },

    /// Stopped by the cancel flag. Records made so far stay in [`Tuner::history`](super::Tuner::history).
    #[error("search cancelled after {recorded_trials} recorded trial rounds")]
    Cancelled { recorded_trials: usize },

    #[error("invalid search configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type TuningResult<T> = Result<T, TuningError>;
