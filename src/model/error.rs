use thiserror::Error;

use crate::constants::DimValidationError;

#[derive(Debug, Error)]
pub enum ModelError {
    /// Inputs do not match the configured input shape, or the conv/pool stack would
    /// collapse to zero length.
    #[error("shape error: {reason}")]
    Shape { reason: String },

    #[error("invalid hyperparameters: {reason}")]
    InvalidHyperparameters { reason: String },

    #[error("model backend error: {reason}")]
    Backend { reason: String },

    #[error("failed to save model weights: {reason}")]
    SaveFailed { reason: String },
}

impl From<candle_core::Error> for ModelError {
    fn from(err: candle_core::Error) -> Self {
        ModelError::Backend {
            reason: err.to_string(),
        }
    }
}

impl From<DimValidationError> for ModelError {
    fn from(err: DimValidationError) -> Self {
        ModelError::Shape {
            reason: err.to_string(),
        }
    }
}

impl ModelError {
    /// Returns `true` for [`ModelError::Shape`].
    pub fn is_shape_error(&self) -> bool {
        matches!(self, ModelError::Shape { .. })
    }
}
