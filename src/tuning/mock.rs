use crate::model::Hyperparameters;
use crate::training::{CancelFlag, TrainingResult};

use super::runner::TrialRunner;

type ScoreFn = Box<dyn FnMut(&Hyperparameters, usize) -> TrainingResult<f64> + Send>;

/// Configuration and epoch count of a mock trial.
#[derive(Debug, Clone, PartialEq)]
pub struct MockTrial {
    pub hyperparameters: Hyperparameters,
    pub epochs: usize,
}

/// [`TrialRunner`] that scores configurations with a closure instead of training.
pub struct MockTrialRunner {
    score: ScoreFn,
    started: Vec<Hyperparameters>,
    advance_calls: usize,
}

impl MockTrialRunner {
    /// `score(hp, to_epoch)` is called for every round a trial is advanced.
    pub fn new<F>(score: F) -> Self
    where
        F: FnMut(&Hyperparameters, usize) -> TrainingResult<f64> + Send + 'static,
    {
        Self {
            score: Box::new(score),
            started: Vec::new(),
            advance_calls: 0,
        }
    }

    pub fn constant(accuracy: f64) -> Self {
        Self::new(move |_, _| Ok(accuracy))
    }

    pub fn started(&self) -> &[Hyperparameters] {
        &self.started
    }

    pub fn advance_calls(&self) -> usize {
        self.advance_calls
    }
}

impl std::fmt::Debug for MockTrialRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTrialRunner")
            .field("started", &self.started.len())
            .field("advance_calls", &self.advance_calls)
            .finish()
    }
}

impl TrialRunner for MockTrialRunner {
    type Trial = MockTrial;

    fn start(&mut self, hp: Hyperparameters) -> TrainingResult<MockTrial> {
        self.started.push(hp);
        Ok(MockTrial {
            hyperparameters: hp,
            epochs: 0,
        })
    }

    fn advance(
        &mut self,
        trial: &mut MockTrial,
        to_epoch: usize,
        _cancel: &CancelFlag,
    ) -> TrainingResult<f64> {
        self.advance_calls += 1;
        let score = (self.score)(&trial.hyperparameters, to_epoch)?;
        trial.epochs = to_epoch;
        Ok(score)
    }
}
