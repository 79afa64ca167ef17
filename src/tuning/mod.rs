//! Hyperband search over Siamese model configurations.
//!
//! [`Tuner`] owns the schedule and the trial history; a [`TrialRunner`] builds and trains
//! each candidate. [`SiameseTrialRunner`] trains real models, `MockTrialRunner` (tests and
//! the `mock` feature) scores them with a closure.
//!
//! # Schedule
//!
//! With `s_max = floor(log_factor(max_epochs))`, each iteration runs brackets
//! `s = s_max..=0`. Bracket `s` samples `ceil((s_max + 1) * factor^s / (s + 1))`
//! configurations; round `i` trains the survivors to `ceil(max_epochs / factor^(s - i))`
//! epochs and keeps the top `max(n_i / factor, 1)`. Defaults (`20`, `3`) give brackets of
//! 9, 5 and 3 configurations.
//!
//! # Failures
//!
//! A trial that fails to build or diverges is recorded with score `f64::NEG_INFINITY` and
//! eliminated. Only a bracket in which no candidate ever completes a round aborts the
//! search with [`TuningError::ConfigurationExhausted`].

pub mod config;
pub mod error;
pub mod hyperband;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod runner;
pub mod space;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::{BracketPlan, HyperbandConfig, RoundPlan};
pub use error::{TuningError, TuningResult};
pub use hyperband::Tuner;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockTrial, MockTrialRunner};
pub use runner::{SiameseTrial, SiameseTrialRunner, TrialRunner};
pub use space::SearchSpace;
pub use types::{SearchOutcome, TrialRecord, TrialStatus, select_best};
