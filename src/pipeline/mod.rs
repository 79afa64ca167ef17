//! End-to-end run: load pairs, search hyperparameters, train the winner, write a report.

pub mod error;

pub use error::PipelineError;

use std::path::Path;

use candle_core::Device;
use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::data::PairDataset;
use crate::model::SiameseModel;
use crate::training::{CancelFlag, Evaluation, Trainer, TrainingHistory};
use crate::tuning::{SearchOutcome, SearchSpace, SiameseTrialRunner, Tuner};

/// Everything a run produces besides the trained weights.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub search: SearchOutcome,
    pub training: TrainingHistory,
    /// Final model on the validation pairs.
    pub validation: Evaluation,
}

/// Loads the dataset named by `config` and runs [`run_on_dataset`] over the default space.
pub fn run(
    config: &Config,
    device: &Device,
    cancel: &CancelFlag,
) -> Result<(SiameseModel, PipelineReport), PipelineError> {
    let dataset = PairDataset::from_json_path(&config.dataset_path)?;
    run_on_dataset(config, &dataset, SearchSpace::default(), device, cancel)
}

/// Searches `space`, retrains the best configuration for `config.train_epochs`, then writes
/// the report to `config.output_path` and the weights to `config.weights_path` if set.
pub fn run_on_dataset(
    config: &Config,
    dataset: &PairDataset,
    space: SearchSpace,
    device: &Device,
    cancel: &CancelFlag,
) -> Result<(SiameseModel, PipelineReport), PipelineError> {
    let trainer = Trainer::new(config.trainer_config())?.with_cancel(cancel.clone());

    let runner = SiameseTrialRunner::new(dataset, device.clone(), trainer.clone());
    let mut tuner =
        Tuner::new(space, config.hyperband_config(), runner)?.with_cancel(cancel.clone());
    let search = tuner.search()?;

    info!(best = %search.best, score = search.best_score, "Training best configuration");
    let mut model = SiameseModel::build(dataset.feature_dim(), search.best, device)?;
    let training = trainer.fit(
        &mut model,
        &dataset.train,
        &dataset.validation,
        config.train_epochs,
    )?;
    let validation = trainer.evaluate(&model, &dataset.validation)?;

    let report = PipelineReport {
        search,
        training,
        validation,
    };
    write_report(&config.output_path, &report)?;

    if let Some(path) = &config.weights_path {
        model.save_weights(path)?;
        info!(path = %path.display(), "Saved model weights");
    }

    info!(
        val_loss = report.validation.loss,
        val_accuracy = report.validation.accuracy,
        output = %config.output_path.display(),
        "Pipeline complete"
    );
    Ok((model, report))
}

fn write_report(path: &Path, report: &PipelineReport) -> Result<(), PipelineError> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).map_err(|source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    })
}
