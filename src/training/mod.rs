//! Mini-batch training of a [`SiameseModel`](crate::model::SiameseModel).
//!
//! Training batches are drawn through a bounded shuffle buffer each epoch; validation
//! batches are sequential. Validation accuracy uses a fixed decision rule: a pair is
//! predicted to match iff its distance is below
//! [`TrainerConfig::match_threshold`].

pub mod cancel;
pub mod config;
pub mod error;
pub mod metrics;
pub mod trainer;


pub use cancel::CancelFlag;
pub use config::TrainerConfig;
pub use error::{TrainingError, TrainingResult};
pub use metrics::{EpochMetrics, Evaluation, TrainingHistory, correct_predictions};
pub use trainer::Trainer;
