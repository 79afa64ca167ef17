use candle_nn::{AdamW, Optimizer, ParamsAdamW};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::constants::validate_matching_dim;
use crate::data::{PairBatch, PairSet, sequential_batches, shuffled_batches};
use crate::model::{ContrastiveLoss, ModelError, SiameseModel};

use super::cancel::CancelFlag;
use super::config::TrainerConfig;
use super::error::{TrainingError, TrainingResult};
use super::metrics::{
    Accumulator, EpochMetrics, Evaluation, TrainingHistory, correct_predictions,
};

/// Adam (AdamW without weight decay) over the model's variables at its learning rate.
pub(crate) fn adam(model: &SiameseModel) -> TrainingResult<AdamW> {
    Ok(AdamW::new(
        model.vars(),
        ParamsAdamW {
            lr: model.hyperparameters().learning_rate,
            weight_decay: 0.0,
            ..Default::default()
        },
    )?)
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct StepOutcome {
    pub(crate) loss: f32,
    pub(crate) correct: usize,
}

/// Mini-batch trainer for [`SiameseModel`].
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainerConfig,
    cancel: CancelFlag,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> TrainingResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancelFlag::new(),
        })
    }

    /// Uses `cancel` to stop between batches and epochs.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Trains `model` for `epochs` epochs from scratch.
    pub fn fit(
        &self,
        model: &mut SiameseModel,
        train: &PairSet,
        validation: &PairSet,
        epochs: usize,
    ) -> TrainingResult<TrainingHistory> {
        self.fit_range(model, train, validation, 0, epochs)
    }

    /// Trains epochs `initial_epoch..epochs`, continuing from the model's current weights.
    ///
    /// Optimizer state starts fresh on every call.
    pub fn fit_range(
        &self,
        model: &mut SiameseModel,
        train: &PairSet,
        validation: &PairSet,
        initial_epoch: usize,
        epochs: usize,
    ) -> TrainingResult<TrainingHistory> {
        self.check_inputs(model, train, validation)?;

        let hp = *model.hyperparameters();
        let mut optimizer = adam(model)?;
        let objective = model.loss();

        info!(
            train = train.len(),
            validation = validation.len(),
            initial_epoch,
            epochs,
            batch_size = self.config.batch_size,
            learning_rate = hp.learning_rate,
            margin = objective.margin(),
            "Starting training"
        );

        let mut history = TrainingHistory::default();
        for epoch in initial_epoch..epochs {
            if self.cancel.is_cancelled() {
                warn!(epoch, "Training cancelled");
                return Err(TrainingError::Cancelled {
                    completed_epochs: epoch,
                });
            }

            let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(epoch as u64));
            let batches = shuffled_batches(
                train.len(),
                self.config.batch_size,
                self.config.shuffle_buffer,
                &mut rng,
            );

            let mut totals = Accumulator::default();
            for (batch_idx, indices) in batches.iter().enumerate() {
                if self.cancel.is_cancelled() {
                    warn!(epoch, batch = batch_idx, "Training cancelled mid-epoch");
                    return Err(TrainingError::Cancelled {
                        completed_epochs: epoch,
                    });
                }

                let batch = PairBatch::gather(train, indices, model.device())?;
                let step =
                    self.train_step(model, &mut optimizer, &objective, &batch, epoch, batch_idx)?;
                totals.record(step.loss, batch.len(), step.correct);
            }

            let train_eval = totals.finish();
            let val_eval = self.evaluate_at(model, validation, epoch)?;

            let metrics = EpochMetrics {
                epoch,
                train_loss: train_eval.loss,
                train_accuracy: train_eval.accuracy,
                val_loss: val_eval.loss,
                val_accuracy: val_eval.accuracy,
            };

            info!(
                epoch = epoch + 1,
                epochs,
                train_loss = metrics.train_loss,
                train_accuracy = metrics.train_accuracy,
                val_loss = metrics.val_loss,
                val_accuracy = metrics.val_accuracy,
                "Epoch complete"
            );

            history.epochs.push(metrics);
        }

        Ok(history)
    }

    /// One optimizer step on `batch`.
    ///
    /// Fails with [`TrainingError::Diverged`] on a non-finite loss or distance before any weight
    /// is touched, and when the step leaves a non-finite weight behind.
    pub(crate) fn train_step(
        &self,
        model: &SiameseModel,
        optimizer: &mut AdamW,
        objective: &ContrastiveLoss,
        batch: &PairBatch,
        epoch: usize,
        batch_idx: usize,
    ) -> TrainingResult<StepOutcome> {
        let distances = model.forward_t(&batch.left, &batch.right, true)?;
        let loss = objective.loss(&batch.labels, &distances)?;
        let loss_value = loss.to_scalar::<f32>()?;
        let distance_values = distances.to_vec1::<f32>()?;

        check_finite(loss_value, &distance_values, epoch, batch_idx)?;

        optimizer.backward_step(&loss)?;

        if !model.weights_finite()? {
            warn!(epoch, batch = batch_idx, loss = loss_value, "Weights are not finite after step");
            return Err(TrainingError::Diverged {
                epoch,
                batch: batch_idx,
                reason: "weights are not finite after the optimizer step".to_string(),
            });
        }

        let correct = correct_predictions(
            &distance_values,
            &batch.label_values,
            self.config.match_threshold,
        );
        Ok(StepOutcome {
            loss: loss_value,
            correct,
        })
    }

    /// Loss and accuracy of `model` on `set`, in dataset order with dropout disabled.
    pub fn evaluate(&self, model: &SiameseModel, set: &PairSet) -> TrainingResult<Evaluation> {
        if set.is_empty() {
            return Err(TrainingError::EmptyDataset { split: "evaluation" });
        }
        validate_matching_dim(model.input_len(), set.feature_dim()).map_err(ModelError::from)?;
        self.evaluate_at(model, set, 0)
    }

    fn evaluate_at(
        &self,
        model: &SiameseModel,
        set: &PairSet,
        epoch: usize,
    ) -> TrainingResult<Evaluation> {
        if !model.weights_finite()? {
            warn!(epoch, "Weights are not finite before evaluation");
            return Err(TrainingError::Diverged {
                epoch,
                batch: 0,
                reason: "weights are not finite".to_string(),
            });
        }

        let objective = model.loss();
        let mut totals = Accumulator::default();

        for (batch_idx, indices) in sequential_batches(set.len(), self.config.batch_size)
            .iter()
            .enumerate()
        {
            let batch = PairBatch::gather(set, indices, model.device())?;
            let distances = model.forward_t(&batch.left, &batch.right, false)?;
            let loss_value = objective.loss(&batch.labels, &distances)?.to_scalar::<f32>()?;
            let distance_values = distances.to_vec1::<f32>()?;

            check_finite(loss_value, &distance_values, epoch, batch_idx)?;

            let correct = correct_predictions(
                &distance_values,
                &batch.label_values,
                self.config.match_threshold,
            );
            totals.record(loss_value, batch.len(), correct);
        }

        let evaluation = totals.finish();
        debug!(
            loss = evaluation.loss,
            accuracy = evaluation.accuracy,
            pairs = set.len(),
            "Evaluation complete"
        );
        Ok(evaluation)
    }

    fn check_inputs(
        &self,
        model: &SiameseModel,
        train: &PairSet,
        validation: &PairSet,
    ) -> TrainingResult<()> {
        if train.is_empty() {
            return Err(TrainingError::EmptyDataset { split: "training" });
        }
        if validation.is_empty() {
            return Err(TrainingError::EmptyDataset {
                split: "validation",
            });
        }
        validate_matching_dim(model.input_len(), train.feature_dim()).map_err(ModelError::from)?;
        validate_matching_dim(model.input_len(), validation.feature_dim())
            .map_err(ModelError::from)?;
        Ok(())
    }
}

fn check_finite(loss: f32, distances: &[f32], epoch: usize, batch: usize) -> TrainingResult<()> {
    if !loss.is_finite() {
        warn!(epoch, batch, loss, "Loss is not finite");
        return Err(TrainingError::Diverged {
            epoch,
            batch,
            reason: format!("loss = {loss}"),
        });
    }
    if let Some(distance) = distances.iter().find(|d| !d.is_finite()) {
        warn!(epoch, batch, distance, "Distance is not finite");
        return Err(TrainingError::Diverged {
            epoch,
            batch,
            reason: format!("distance = {distance}"),
        });
    }
    Ok(())
}
