//! Pair datasets and mini-batching.
//!
//! - [`pairs`]: validated `(N, 2, D)` pair arrays with `(N,)` labels, train/validation split.
//! - [`batch`]: buffer shuffle for training batches, sequential batches for validation.
//! - [`sampler`]: builds labelled pairs from entity-tagged records.

pub mod batch;
pub mod error;
pub mod pairs;
pub mod sampler;


pub use batch::{PairBatch, ShuffleBuffer, sequential_batches, shuffled_batches};
pub use error::DataError;
pub use pairs::{FeatureVector, Pair, PairDataset, PairSet};
pub use sampler::PairSampler;
