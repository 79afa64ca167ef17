//! Siamese pair scorer.
//!
//! - [`tower`] maps one record to an embedding (conv blocks + dense head).
//! - [`siamese`] runs the single tower on both pair members and returns their distance.
//! - [`loss`] is the contrastive objective, bound to a configuration's margin.
//!
//! # Weight Sharing
//!
//! [`SiameseModel`] owns exactly one [`EmbeddingTower`]. Both members of a pair go through
//! that same instance, so any optimizer update is seen by both branches and
//! `distance(a, b) == distance(b, a)` always holds.

pub mod error;
pub mod hyperparams;
pub mod loss;
pub mod siamese;
pub mod tower;


pub use error::ModelError;
pub use hyperparams::Hyperparameters;
pub use loss::ContrastiveLoss;
pub use siamese::{SiameseModel, euclidean_distance};
pub use tower::{EmbeddingTower, tower_output_len};
