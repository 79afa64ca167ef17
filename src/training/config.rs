use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_MATCH_THRESHOLD, DEFAULT_SEED, DEFAULT_SHUFFLE_BUFFER,
};

use super::error::TrainingError;

/// Configuration for [`Trainer`](super::Trainer).
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    /// Pairs per mini-batch. Default: `128`.
    pub batch_size: usize,
    /// Shuffle buffer for training batches. Default: `1024`.
    pub shuffle_buffer: usize,
    /// A pair is predicted to match when its distance is below this. Default: `0.5`.
    pub match_threshold: f32,
    /// Base seed for per-epoch shuffling.
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            shuffle_buffer: DEFAULT_SHUFFLE_BUFFER,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            seed: DEFAULT_SEED,
        }
    }
}

impl TrainerConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_match_threshold(mut self, match_threshold: f32) -> Self {
        self.match_threshold = match_threshold;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), TrainingError> {
        if self.batch_size == 0 {
            return Err(TrainingError::InvalidConfig {
                reason: "batch_size must be > 0".to_string(),
            });
        }
        if self.shuffle_buffer == 0 {
            return Err(TrainingError::InvalidConfig {
                reason: "shuffle_buffer must be > 0".to_string(),
            });
        }
        if !self.match_threshold.is_finite() || self.match_threshold <= 0.0 {
            return Err(TrainingError::InvalidConfig {
                reason: format!(
                    "match_threshold must be positive, got {}",
                    self.match_threshold
                ),
            });
        }
        Ok(())
    }
}
