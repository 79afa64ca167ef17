//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `TWIN_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_HYPERBAND_FACTOR, DEFAULT_HYPERBAND_ITERATIONS,
    DEFAULT_MATCH_THRESHOLD, DEFAULT_MAX_EPOCHS, DEFAULT_SEED, DEFAULT_SHUFFLE_BUFFER,
    DEFAULT_TRAIN_EPOCHS,
};
use crate::training::TrainerConfig;
use crate::tuning::HyperbandConfig;

/// Pipeline configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `TWIN_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// JSON pair dataset to train on. Default: `./data/pairs.json`.
    pub dataset_path: PathBuf,

    /// Where the search outcome is written. Default: `./search_outcome.json`.
    pub output_path: PathBuf,

    /// Where the final model weights are saved (safetensors). Not saved when unset.
    pub weights_path: Option<PathBuf>,

    /// Pairs per mini-batch. Default: `128`.
    pub batch_size: usize,

    /// Shuffle buffer for training batches. Default: `1024`.
    pub shuffle_buffer: usize,

    /// Epochs of the final training run. Default: `20`.
    pub train_epochs: usize,

    /// Hyperband epoch budget per configuration. Default: `20`.
    pub max_epochs: usize,

    /// Hyperband reduction factor. Default: `3`.
    pub hyperband_factor: usize,

    /// Hyperband iterations. Default: `2`.
    pub hyperband_iterations: usize,

    /// Seed for sampling and shuffling. Default: `42`.
    pub seed: u64,

    /// Distance below which a pair counts as a match. Default: `0.5`.
    pub match_threshold: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("./data/pairs.json"),
            output_path: PathBuf::from("./search_outcome.json"),
            weights_path: None,
            batch_size: DEFAULT_BATCH_SIZE,
            shuffle_buffer: DEFAULT_SHUFFLE_BUFFER,
            train_epochs: DEFAULT_TRAIN_EPOCHS,
            max_epochs: DEFAULT_MAX_EPOCHS,
            hyperband_factor: DEFAULT_HYPERBAND_FACTOR,
            hyperband_iterations: DEFAULT_HYPERBAND_ITERATIONS,
            seed: DEFAULT_SEED,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl Config {
    const ENV_DATASET_PATH: &'static str = "TWIN_DATASET_PATH";
    const ENV_OUTPUT_PATH: &'static str = "TWIN_OUTPUT_PATH";
    const ENV_WEIGHTS_PATH: &'static str = "TWIN_WEIGHTS_PATH";
    const ENV_BATCH_SIZE: &'static str = "TWIN_BATCH_SIZE";
    const ENV_SHUFFLE_BUFFER: &'static str = "TWIN_SHUFFLE_BUFFER";
    const ENV_TRAIN_EPOCHS: &'static str = "TWIN_TRAIN_EPOCHS";
    const ENV_MAX_EPOCHS: &'static str = "TWIN_MAX_EPOCHS";
    const ENV_HYPERBAND_FACTOR: &'static str = "TWIN_HYPERBAND_FACTOR";
    const ENV_HYPERBAND_ITERATIONS: &'static str = "TWIN_HYPERBAND_ITERATIONS";
    const ENV_SEED: &'static str = "TWIN_SEED";
    const ENV_MATCH_THRESHOLD: &'static str = "TWIN_MATCH_THRESHOLD";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            dataset_path: Self::parse_path_from_env(Self::ENV_DATASET_PATH, defaults.dataset_path),
            output_path: Self::parse_path_from_env(Self::ENV_OUTPUT_PATH, defaults.output_path),
            weights_path: Self::parse_optional_path_from_env(Self::ENV_WEIGHTS_PATH),
            batch_size: Self::parse_from_env(Self::ENV_BATCH_SIZE, defaults.batch_size)?,
            shuffle_buffer: Self::parse_from_env(Self::ENV_SHUFFLE_BUFFER, defaults.shuffle_buffer)?,
            train_epochs: Self::parse_from_env(Self::ENV_TRAIN_EPOCHS, defaults.train_epochs)?,
            max_epochs: Self::parse_from_env(Self::ENV_MAX_EPOCHS, defaults.max_epochs)?,
            hyperband_factor: Self::parse_from_env(
                Self::ENV_HYPERBAND_FACTOR,
                defaults.hyperband_factor,
            )?,
            hyperband_iterations: Self::parse_from_env(
                Self::ENV_HYPERBAND_ITERATIONS,
                defaults.hyperband_iterations,
            )?,
            seed: Self::parse_from_env(Self::ENV_SEED, defaults.seed)?,
            match_threshold: Self::parse_from_env(
                Self::ENV_MATCH_THRESHOLD,
                defaults.match_threshold,
            )?,
        })
    }

    /// Validates paths and numeric invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.dataset_path.exists() {
            return Err(ConfigError::PathNotFound {
                path: self.dataset_path.clone(),
            });
        }
        if !self.dataset_path.is_file() {
            return Err(ConfigError::NotAFile {
                path: self.dataset_path.clone(),
            });
        }

        Self::validate_parent_dir(&self.output_path)?;
        if let Some(ref path) = self.weights_path {
            Self::validate_parent_dir(path)?;
        }

        for (name, value) in [
            (Self::ENV_BATCH_SIZE, self.batch_size),
            (Self::ENV_SHUFFLE_BUFFER, self.shuffle_buffer),
            (Self::ENV_TRAIN_EPOCHS, self.train_epochs),
            (Self::ENV_MAX_EPOCHS, self.max_epochs),
            (Self::ENV_HYPERBAND_ITERATIONS, self.hyperband_iterations),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    name,
                    reason: "must be > 0".to_string(),
                });
            }
        }

        if self.hyperband_factor < 2 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_HYPERBAND_FACTOR,
                reason: format!("must be >= 2, got {}", self.hyperband_factor),
            });
        }

        if !self.match_threshold.is_finite() || self.match_threshold <= 0.0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_MATCH_THRESHOLD,
                reason: format!("must be positive, got {}", self.match_threshold),
            });
        }

        Ok(())
    }

    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            batch_size: self.batch_size,
            shuffle_buffer: self.shuffle_buffer,
            match_threshold: self.match_threshold,
            seed: self.seed,
        }
    }

    pub fn hyperband_config(&self) -> HyperbandConfig {
        HyperbandConfig {
            max_epochs: self.max_epochs,
            factor: self.hyperband_factor,
            iterations: self.hyperband_iterations,
            seed: self.seed,
        }
    }

    fn validate_parent_dir(path: &Path) -> Result<(), ConfigError> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                if !parent.exists() {
                    return Err(ConfigError::PathNotFound {
                        path: parent.to_path_buf(),
                    });
                }
                if !parent.is_dir() {
                    return Err(ConfigError::NotADirectory {
                        path: parent.to_path_buf(),
                    });
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::ParseError {
                    name: var_name,
                    reason: e.to_string(),
                    value,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }
}
