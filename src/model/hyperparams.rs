use serde::{Deserialize, Serialize};

use super::error::ModelError;

/// One concrete assignment of every tunable hyperparameter (a trial configuration).
///
/// Values are copied into each model and loss at build time; nothing reads them back from
/// shared state afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Width of the embedding produced by the tower.
    pub embedding_dim: usize,
    /// Legacy hidden width; part of the search space but not consumed by the tower.
    pub lstm_units: usize,
    /// Width of the dense layer after the conv blocks.
    pub fc_units: usize,
    /// Dropout rate applied after the dense layer during training.
    pub dropout_rate: f32,
    /// Adam learning rate.
    pub learning_rate: f64,
    /// Contrastive-loss margin for non-matching pairs.
    pub margin: f32,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            embedding_dim: 64,
            lstm_units: 128,
            fc_units: 64,
            dropout_rate: 0.2,
            learning_rate: 0.001,
            margin: 1.0,
        }
    }
}

impl Hyperparameters {
    /// Checks that every value is usable to build and train a model.
    pub fn validate(&self) -> Result<(), ModelError> {
        let invalid = |reason: String| Err(ModelError::InvalidHyperparameters { reason });

        if self.embedding_dim == 0 {
            return invalid("embedding_dim must be > 0".to_string());
        }
        if self.fc_units == 0 {
            return invalid("fc_units must be > 0".to_string());
        }
        if !(0.0..1.0).contains(&self.dropout_rate) {
            return invalid(format!(
                "dropout_rate must be in [0, 1), got {}",
                self.dropout_rate
            ));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return invalid(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            ));
        }
        if !self.margin.is_finite() || self.margin <= 0.0 {
            return invalid(format!("margin must be positive, got {}", self.margin));
        }
        Ok(())
    }
}

impl std::fmt::Display for Hyperparameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "embedding_dim={} lstm_units={} fc_units={} dropout_rate={} learning_rate={} margin={}",
            self.embedding_dim,
            self.lstm_units,
            self.fc_units,
            self.dropout_rate,
            self.learning_rate,
            self.margin
        )
    }
}
