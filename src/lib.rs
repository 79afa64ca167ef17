//! Twin library crate (used by the `twin` binary and integration tests).
//!
//! Siamese-network entity resolution: pairs of records are embedded by one shared
//! convolutional tower and scored by the Euclidean distance between their embeddings.
//!
//! # Public API Surface
//!
//! ## Model
//! - [`SiameseModel`], [`EmbeddingTower`] - Shared-weight pair scorer
//! - [`ContrastiveLoss`] - Objective bound to a configuration's margin
//! - [`Hyperparameters`] - One trial configuration
//!
//! ## Data
//! - [`PairSet`], [`PairDataset`] - Validated `(N, 2, D)` pairs with labels
//! - [`PairSampler`] - Labelled pairs from entity-tagged records
//! - [`Table`], [`ColumnMapping`], [`describe`] - In-memory preparation ahead of sampling
//!
//! ## Training & Search
//! - [`Trainer`], [`TrainerConfig`], [`TrainingHistory`] - Mini-batch training
//! - [`Tuner`], [`SearchSpace`], [`HyperbandConfig`] - Hyperband search
//! - [`CancelFlag`] - Cooperative cancellation shared by both
//!
//! ## Runtime
//! - [`Config`] - `TWIN_*` environment configuration
//! - [`probe_capabilities`] - Device pre-flight
//! - [`pipeline::run`] - Search, retrain and report in one call
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod data;
pub mod device;
pub mod model;
pub mod pipeline;
pub mod prepare;
pub mod training;
pub mod tuning;

pub use config::{Config, ConfigError};
pub use constants::{DimValidationError, MIN_FEATURE_DIM, validate_feature_dim};
pub use data::{DataError, FeatureVector, Pair, PairBatch, PairDataset, PairSampler, PairSet};
pub use device::{DeviceCapabilities, DeviceError, DeviceKind, probe_capabilities};
pub use model::{
    ContrastiveLoss, EmbeddingTower, Hyperparameters, ModelError, SiameseModel,
    euclidean_distance, tower_output_len,
};
pub use pipeline::{PipelineError, PipelineReport};
#[cfg(any(test, feature = "mock"))]
pub use prepare::MockGeocoder;
pub use prepare::{
    Cell, Column, ColumnMapping, Geocoder, PrepareError, Table, TableSummary, describe,
    normalize_addresses, preprocess_text_columns,
};
pub use training::{
    CancelFlag, EpochMetrics, Evaluation, Trainer, TrainerConfig, TrainingError,
    TrainingHistory,
};
#[cfg(any(test, feature = "mock"))]
pub use tuning::MockTrialRunner;
pub use tuning::{
    HyperbandConfig, SearchOutcome, SearchSpace, SiameseTrialRunner, TrialRecord, TrialRunner,
    TrialStatus, Tuner, TuningError,
};
