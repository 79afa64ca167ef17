use crate::constants::{
    DEFAULT_HYPERBAND_FACTOR, DEFAULT_HYPERBAND_ITERATIONS, DEFAULT_MAX_EPOCHS, DEFAULT_SEED,
};

use super::error::TuningError;

/// Configuration for the Hyperband search.
#[derive(Debug, Clone)]
pub struct HyperbandConfig {
    /// Epochs a configuration trains for in the last round of any bracket. Default: `20`.
    pub max_epochs: usize,
    /// Reduction factor between rounds. Default: `3`.
    pub factor: usize,
    /// Times the full set of brackets is run. Default: `2`.
    pub iterations: usize,
    /// Seed for configuration sampling.
    pub seed: u64,
}

impl Default for HyperbandConfig {
    fn default() -> Self {
        Self {
            max_epochs: DEFAULT_MAX_EPOCHS,
            factor: DEFAULT_HYPERBAND_FACTOR,
            iterations: DEFAULT_HYPERBAND_ITERATIONS,
            seed: DEFAULT_SEED,
        }
    }
}

/// One successive-halving round: train every candidate up to `epochs`, then keep `keep`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundPlan {
    /// Cumulative epochs trained by the end of the round.
    pub epochs: usize,
    pub candidates: usize,
    /// Survivors promoted to the next round (0 after the last round).
    pub keep: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketPlan {
    /// Bracket index `s`; higher brackets start more configurations on fewer epochs.
    pub bracket: usize,
    pub rounds: Vec<RoundPlan>,
}

impl BracketPlan {
    /// Configurations sampled at the start of the bracket.
    pub fn population(&self) -> usize {
        self.rounds.first().map_or(0, |r| r.candidates)
    }
}

impl HyperbandConfig {
    pub fn with_max_epochs(mut self, max_epochs: usize) -> Self {
        self.max_epochs = max_epochs;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if self.max_epochs == 0 {
            return Err(TuningError::InvalidConfig {
                reason: "max_epochs must be > 0".to_string(),
            });
        }
        if self.factor < 2 {
            return Err(TuningError::InvalidConfig {
                reason: format!("factor must be >= 2, got {}", self.factor),
            });
        }
        if self.iterations == 0 {
            return Err(TuningError::InvalidConfig {
                reason: "iterations must be > 0".to_string(),
            });
        }
        Ok(())
    }

    /// `floor(log_factor(max_epochs))`.
    pub fn max_bracket(&self) -> usize {
        let mut s = 0;
        let mut budget = self.factor;
        while budget <= self.max_epochs {
            s += 1;
            budget = budget.saturating_mul(self.factor);
        }
        s
    }

    /// Brackets of one iteration, most exploratory first.
    pub fn brackets(&self) -> Vec<BracketPlan> {
        let s_max = self.max_bracket();
        (0..=s_max)
            .rev()
            .map(|s| {
                let population = ((s_max + 1) * self.factor.pow(s as u32)).div_ceil(s + 1);
                let mut rounds = Vec::with_capacity(s + 1);
                let mut candidates = population;
                for i in 0..=s {
                    let epochs = self.max_epochs.div_ceil(self.factor.pow((s - i) as u32));
                    let keep = if i == s {
                        0
                    } else {
                        (candidates / self.factor).max(1)
                    };
                    rounds.push(RoundPlan {
                        epochs,
                        candidates,
                        keep,
                    });
                    candidates = keep;
                }
                BracketPlan { bracket: s, rounds }
            })
            .collect()
    }
}
