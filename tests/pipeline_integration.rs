//! End-to-end runs of the search and training pipeline on small synthetic data.

mod common;

use candle_core::Device;
use common::fixtures::{FEATURE_DIM, dataset_json, pair_set, record, small_hp};
use tempfile::TempDir;
use twin::pipeline::{self, PipelineError};
use twin::{
    CancelFlag, Config, DataError, HyperbandConfig, PairDataset, SearchSpace, SiameseModel,
    SiameseTrialRunner, Trainer, TrainerConfig, TrialStatus, Tuner, TuningError,
};

fn tiny_config(dir: &TempDir) -> Config {
    let dataset_path = dir.path().join("pairs.json");
    std::fs::write(&dataset_path, dataset_json(12, 6)).unwrap();
    Config {
        dataset_path,
        output_path: dir.path().join("outcome.json"),
        weights_path: Some(dir.path().join("model.safetensors")),
        batch_size: 4,
        train_epochs: 2,
        max_epochs: 1,
        hyperband_iterations: 1,
        ..Default::default()
    }
}

#[test]
fn test_pipeline_writes_report_and_weights() {
    let dir = TempDir::new().unwrap();
    let config = tiny_config(&dir);
    config.validate().unwrap();

    let (model, report) = pipeline::run(&config, &Device::Cpu, &CancelFlag::new()).unwrap();

    assert!(SearchSpace::default().contains(&report.search.best));
    assert_eq!(model.hyperparameters(), &report.search.best);
    assert_eq!(report.training.len(), 2);
    assert!((0.0..=1.0).contains(&report.validation.accuracy));

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&config.output_path).unwrap()).unwrap();
    assert_eq!(
        written["search"]["best"]["margin"].as_f64().unwrap() as f32,
        report.search.best.margin
    );
    assert_eq!(written["training"]["epochs"].as_array().unwrap().len(), 2);
    assert!(dir.path().join("model.safetensors").exists());
}

#[test]
fn test_pipeline_with_fixed_space() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        weights_path: None,
        ..tiny_config(&dir)
    };
    let dataset = PairDataset::new(pair_set(8, 0), pair_set(4, 50)).unwrap();

    let (model, report) = pipeline::run_on_dataset(
        &config,
        &dataset,
        SearchSpace::single(small_hp()),
        &Device::Cpu,
        &CancelFlag::new(),
    )
    .unwrap();

    assert_eq!(report.search.best, small_hp());
    let d = model.distance(&record(1, 0.0), &record(1, 0.0)).unwrap();
    assert!(d < 1e-4, "self distance {d}");
    assert!(!dir.path().join("model.safetensors").exists());
}

#[test]
fn test_pipeline_missing_dataset() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        dataset_path: dir.path().join("absent.json"),
        ..tiny_config(&dir)
    };
    let err = pipeline::run(&config, &Device::Cpu, &CancelFlag::new()).unwrap_err();
    assert!(matches!(err, PipelineError::Data(DataError::NotFound { .. })));
}

#[test]
fn test_pipeline_cancelled() {
    let dir = TempDir::new().unwrap();
    let config = tiny_config(&dir);
    let cancel = CancelFlag::new();
    cancel.cancel();

    let err = pipeline::run(&config, &Device::Cpu, &cancel).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Tuning(TuningError::Cancelled { .. })
    ));
    assert!(!config.output_path.exists());
}

#[test]
fn test_search_then_retrain_public_api() {
    let dataset = PairDataset::new(pair_set(10, 0), pair_set(6, 30)).unwrap();
    assert_eq!(dataset.feature_dim(), FEATURE_DIM);

    let trainer = Trainer::new(TrainerConfig::default().with_batch_size(4)).unwrap();
    let runner = SiameseTrialRunner::new(&dataset, Device::Cpu, trainer.clone());
    let config = HyperbandConfig::default()
        .with_max_epochs(3)
        .with_iterations(1)
        .with_seed(11);
    let space = SearchSpace {
        embedding_dim: vec![32],
        lstm_units: vec![64],
        fc_units: vec![32, 64],
        dropout_rate: vec![0.1],
        learning_rate: vec![0.001],
        margin: vec![0.5, 1.0],
    };
    let mut tuner = Tuner::new(space.clone(), config, runner).unwrap();
    let outcome = tuner.search().unwrap();

    assert!(space.contains(&outcome.best));
    // max_epochs 3, factor 3: brackets of 3 and 2 configurations
    assert_eq!(outcome.history.iter().filter(|r| r.round == 0).count(), 5);
    assert!(outcome.history.iter().all(|r| r.status == TrialStatus::Completed));

    let mut model = SiameseModel::build(dataset.feature_dim(), outcome.best, &Device::Cpu).unwrap();
    let history = trainer
        .fit(&mut model, &dataset.train, &dataset.validation, 2)
        .unwrap();
    assert_eq!(history.len(), 2);

    let a = record(3, 0.0);
    let b = record(9, 0.0);
    assert_eq!(model.distance(&a, &b).unwrap(), model.distance(&b, &a).unwrap());
}
