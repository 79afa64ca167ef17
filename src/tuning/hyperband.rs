use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::model::Hyperparameters;
use crate::training::{CancelFlag, TrainingError};

use super::config::{BracketPlan, HyperbandConfig};
use super::error::{TuningError, TuningResult};
use super::runner::TrialRunner;
use super::space::SearchSpace;
use super::types::{SearchOutcome, TrialRecord, TrialStatus, select_best};

/// Sampling attempts per bracket slot before duplicates are accepted.
const DEDUP_ATTEMPTS: usize = 16;

struct Candidate<T> {
    trial_id: usize,
    hyperparameters: Hyperparameters,
    trial: T,
}

/// Hyperband search over a [`SearchSpace`].
///
/// Every bracket samples its own population, trains it in successive-halving rounds and
/// promotes the best `1/factor` of each round. A candidate that fails is recorded with the
/// worst possible score and dropped; the rest of the bracket carries on.
pub struct Tuner<R: TrialRunner> {
    space: SearchSpace,
    config: HyperbandConfig,
    runner: R,
    cancel: CancelFlag,
    history: Vec<TrialRecord>,
    next_trial_id: usize,
}

impl<R: TrialRunner> Tuner<R> {
    pub fn new(space: SearchSpace, config: HyperbandConfig, runner: R) -> TuningResult<Self> {
        config.validate()?;
        Ok(Self {
            space,
            config,
            runner,
            cancel: CancelFlag::new(),
            history: Vec::new(),
            next_trial_id: 0,
        })
    }

    /// Uses `cancel` to stop the search between rounds and inside training.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn space(&self) -> &SearchSpace {
        &self.space
    }

    pub fn config(&self) -> &HyperbandConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Every trial round recorded by the last (possibly interrupted) search.
    pub fn history(&self) -> &[TrialRecord] {
        &self.history
    }

    /// Runs all iterations and returns the best configuration found.
    pub fn search(&mut self) -> TuningResult<SearchOutcome> {
        if self.space.is_empty() {
            return Err(TuningError::ConfigurationExhausted {
                reason: "search space has a dimension with no choices".to_string(),
            });
        }
        self.runner.check()?;

        self.history.clear();
        self.next_trial_id = 0;
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let brackets = self.config.brackets();

        info!(
            space_size = self.space.size(),
            max_epochs = self.config.max_epochs,
            factor = self.config.factor,
            iterations = self.config.iterations,
            brackets = brackets.len(),
            "Starting hyperband search"
        );

        for iteration in 0..self.config.iterations {
            for plan in &brackets {
                self.run_bracket(iteration, plan, &mut rng)?;
            }
        }

        let best = select_best(&self.history).ok_or_else(|| TuningError::ConfigurationExhausted {
            reason: "no trial completed".to_string(),
        })?;
        let outcome = SearchOutcome {
            best: best.hyperparameters,
            best_trial_id: best.trial_id,
            best_score: best.val_accuracy,
            history: self.history.clone(),
        };

        info!(
            best_trial = outcome.best_trial_id,
            best_score = outcome.best_score,
            trials = self.next_trial_id,
            records = outcome.history.len(),
            best = %outcome.best,
            "Hyperband search complete"
        );
        Ok(outcome)
    }

    fn run_bracket(
        &mut self,
        iteration: usize,
        plan: &BracketPlan,
        rng: &mut StdRng,
    ) -> TuningResult<()> {
        let configs = self.sample_population(plan.population(), rng)?;
        debug!(
            iteration,
            bracket = plan.bracket,
            population = configs.len(),
            "Starting bracket"
        );

        let mut alive = Vec::with_capacity(configs.len());
        for hp in configs {
            let trial_id = self.next_trial_id;
            self.next_trial_id += 1;
            match self.runner.start(hp) {
                Ok(trial) => alive.push(Candidate {
                    trial_id,
                    hyperparameters: hp,
                    trial,
                }),
                Err(err) => {
                    self.check_cancelled(&err)?;
                    warn!(trial_id, error = %err, "Trial failed to build");
                    self.record_failure(trial_id, iteration, plan.bracket, 0, hp, 0, &err);
                }
            }
        }

        let mut any_completed = false;
        for (round, round_plan) in plan.rounds.iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!(iteration, bracket = plan.bracket, round, "Search cancelled");
                return Err(self.cancelled());
            }

            let mut scored = Vec::with_capacity(alive.len());
            for mut candidate in alive {
                match self
                    .runner
                    .advance(&mut candidate.trial, round_plan.epochs, &self.cancel)
                {
                    Ok(score) if score.is_finite() => {
                        debug!(
                            trial_id = candidate.trial_id,
                            round,
                            epochs = round_plan.epochs,
                            score,
                            "Trial round complete"
                        );
                        self.history.push(TrialRecord {
                            trial_id: candidate.trial_id,
                            iteration,
                            bracket: plan.bracket,
                            round,
                            hyperparameters: candidate.hyperparameters,
                            epochs: round_plan.epochs,
                            val_accuracy: score,
                            status: TrialStatus::Completed,
                        });
                        scored.push((score, candidate));
                    }
                    Ok(score) => {
                        warn!(trial_id = candidate.trial_id, score, "Trial score is not finite");
                        self.history.push(TrialRecord {
                            trial_id: candidate.trial_id,
                            iteration,
                            bracket: plan.bracket,
                            round,
                            hyperparameters: candidate.hyperparameters,
                            epochs: round_plan.epochs,
                            val_accuracy: f64::NEG_INFINITY,
                            status: TrialStatus::Diverged,
                        });
                    }
                    Err(err) => {
                        self.check_cancelled(&err)?;
                        warn!(trial_id = candidate.trial_id, round, error = %err, "Trial failed");
                        self.record_failure(
                            candidate.trial_id,
                            iteration,
                            plan.bracket,
                            round,
                            candidate.hyperparameters,
                            round_plan.epochs,
                            &err,
                        );
                    }
                }
            }

            any_completed |= !scored.is_empty();
            if scored.is_empty() {
                break;
            }

            scored.sort_by(|(a, ca), (b, cb)| b.total_cmp(a).then(ca.trial_id.cmp(&cb.trial_id)));
            alive = scored
                .into_iter()
                .take(round_plan.keep)
                .map(|(_, candidate)| candidate)
                .collect();
        }

        if !any_completed {
            return Err(TuningError::ConfigurationExhausted {
                reason: format!(
                    "every candidate of bracket {} in iteration {} failed",
                    plan.bracket, iteration
                ),
            });
        }
        Ok(())
    }

    /// `count` configurations, distinct while the space allows it.
    fn sample_population(
        &self,
        count: usize,
        rng: &mut StdRng,
    ) -> TuningResult<Vec<Hyperparameters>> {
        let mut configs: Vec<Hyperparameters> = Vec::with_capacity(count);
        let mut attempts = 0;
        while configs.len() < count {
            let hp = self
                .space
                .sample(rng)
                .ok_or_else(|| TuningError::ConfigurationExhausted {
                    reason: "search space is empty".to_string(),
                })?;
            attempts += 1;
            if !configs.contains(&hp) || attempts > count * DEDUP_ATTEMPTS {
                configs.push(hp);
            }
        }
        Ok(configs)
    }

    fn check_cancelled(&self, err: &TrainingError) -> TuningResult<()> {
        if matches!(err, TrainingError::Cancelled { .. }) {
            return Err(self.cancelled());
        }
        Ok(())
    }

    fn cancelled(&self) -> TuningError {
        TuningError::Cancelled {
            recorded_trials: self.history.len(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn record_failure(
        &mut self,
        trial_id: usize,
        iteration: usize,
        bracket: usize,
        round: usize,
        hyperparameters: Hyperparameters,
        epochs: usize,
        err: &TrainingError,
    ) {
        let status = if err.is_diverged() {
            TrialStatus::Diverged
        } else {
            TrialStatus::Failed
        };
        self.history.push(TrialRecord {
            trial_id,
            iteration,
            bracket,
            round,
            hyperparameters,
            epochs,
            val_accuracy: f64::NEG_INFINITY,
            status,
        });
    }
}

impl<R: TrialRunner + std::fmt::Debug> std::fmt::Debug for Tuner<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tuner")
            .field("space", &self.space)
            .field("config", &self.config)
            .field("runner", &self.runner)
            .field("records", &self.history.len())
            .finish()
    }
}
