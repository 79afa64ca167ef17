use candle_core::Device;
use tracing::debug;

use crate::constants::validate_feature_dim;
use crate::data::PairDataset;
use crate::model::{Hyperparameters, ModelError, SiameseModel};
use crate::training::{CancelFlag, Trainer, TrainingError, TrainingResult};

/// Builds and trains candidate configurations on behalf of the search.
///
/// A trial is resumable: `advance` is called with increasing `to_epoch` values and must
/// continue from where the previous call stopped.
pub trait TrialRunner {
    type Trial;

    /// Rejects inputs no configuration could train on. Called once before any trial.
    fn check(&self) -> Result<(), ModelError> {
        Ok(())
    }

    /// Builds a fresh, untrained candidate for `hp`.
    fn start(&mut self, hp: Hyperparameters) -> TrainingResult<Self::Trial>;

    /// Trains `trial` until it has completed `to_epoch` epochs and returns its validation
    /// accuracy.
    fn advance(
        &mut self,
        trial: &mut Self::Trial,
        to_epoch: usize,
        cancel: &CancelFlag,
    ) -> TrainingResult<f64>;
}

/// A [`SiameseModel`] under search, with the epochs it has trained so far.
#[derive(Debug)]
pub struct SiameseTrial {
    pub model: SiameseModel,
    pub epochs: usize,
}

/// Trains real [`SiameseModel`]s on a borrowed dataset.
#[derive(Debug)]
pub struct SiameseTrialRunner<'a> {
    dataset: &'a PairDataset,
    device: Device,
    trainer: Trainer,
}

impl<'a> SiameseTrialRunner<'a> {
    pub fn new(dataset: &'a PairDataset, device: Device, trainer: Trainer) -> Self {
        Self {
            dataset,
            device,
            trainer,
        }
    }
}

impl TrialRunner for SiameseTrialRunner<'_> {
    type Trial = SiameseTrial;

    fn check(&self) -> Result<(), ModelError> {
        validate_feature_dim(self.dataset.feature_dim())?;
        Ok(())
    }

    fn start(&mut self, hp: Hyperparameters) -> TrainingResult<SiameseTrial> {
        let model = SiameseModel::build(self.dataset.feature_dim(), hp, &self.device)?;
        Ok(SiameseTrial { model, epochs: 0 })
    }

    fn advance(
        &mut self,
        trial: &mut SiameseTrial,
        to_epoch: usize,
        cancel: &CancelFlag,
    ) -> TrainingResult<f64> {
        let trainer = self.trainer.clone().with_cancel(cancel.clone());

        if to_epoch <= trial.epochs {
            let eval = trainer.evaluate(&trial.model, &self.dataset.validation)?;
            return Ok(eval.accuracy as f64);
        }

        let history = trainer.fit_range(
            &mut trial.model,
            &self.dataset.train,
            &self.dataset.validation,
            trial.epochs,
            to_epoch,
        )?;
        trial.epochs = to_epoch;

        let accuracy = history
            .final_val_accuracy()
            .ok_or(TrainingError::EmptyDataset {
                split: "validation",
            })?;
        debug!(epochs = to_epoch, accuracy, "Trial advanced");
        Ok(accuracy as f64)
    }
}
