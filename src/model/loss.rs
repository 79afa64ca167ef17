use candle_core::{Result, Tensor};

use super::hyperparams::Hyperparameters;

/// Contrastive loss with its margin bound at construction.
///
/// `mean(y * d^2 + (1 - y) * max(m - d, 0)^2)`: matching pairs are pulled to zero distance,
/// non-matching pairs are pushed out to at least the margin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastiveLoss {
    margin: f64,
}

impl ContrastiveLoss {
    pub fn new(margin: f64) -> Self {
        Self { margin }
    }

    /// Loss bound to the margin of a specific trial configuration.
    pub fn for_hyperparameters(hp: &Hyperparameters) -> Self {
        Self::new(hp.margin as f64)
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Computes the scalar loss for `labels` (1 = match) against predicted `distances`.
    ///
    /// Both tensors are `(batch,)`; labels are cast to the distance dtype.
    pub fn loss(&self, labels: &Tensor, distances: &Tensor) -> Result<Tensor> {
        let labels = labels.to_dtype(distances.dtype())?;
        let positive = distances.sqr()?;
        let negative = distances.affine(-1.0, self.margin)?.relu()?.sqr()?;
        let not_labels = labels.affine(-1.0, 1.0)?;
        (labels.mul(&positive)? + not_labels.mul(&negative)?)?.mean_all()
    }
}
