use std::path::Path;

use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{VarBuilder, VarMap};
use tracing::debug;

use crate::constants::{DISTANCE_EPSILON, validate_feature_dim, validate_matching_dim};

use super::error::ModelError;
use super::hyperparams::Hyperparameters;
use super::loss::ContrastiveLoss;
use super::tower::EmbeddingTower;

/// Row-wise Euclidean distance between two `(batch, dim)` embeddings, shape `(batch,)`.
///
/// The squared sum is clamped at zero before the square root. NaN passes through unchanged
/// so callers can detect it.
pub fn euclidean_distance(a: &Tensor, b: &Tensor) -> candle_core::Result<Tensor> {
    // A sum of squares is never negative, so `abs` is the zero clamp; `relu` would map NaN to 0.
    (a - b)?
        .sqr()?
        .sum(1)?
        .abs()?
        .affine(1.0, DISTANCE_EPSILON)?
        .sqrt()
}

/// Twin-tower scorer: one [`EmbeddingTower`] applied to both members of a pair.
pub struct SiameseModel {
    varmap: VarMap,
    tower: EmbeddingTower,
    hyperparameters: Hyperparameters,
    device: Device,
}

impl std::fmt::Debug for SiameseModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiameseModel")
            .field("device", &format!("{:?}", self.device))
            .field("tower", &self.tower)
            .field("hyperparameters", &self.hyperparameters)
            .finish()
    }
}

impl SiameseModel {
    /// Builds a freshly initialized scorer for records of length `input_len`.
    pub fn build(
        input_len: usize,
        hyperparameters: Hyperparameters,
        device: &Device,
    ) -> Result<Self, ModelError> {
        validate_feature_dim(input_len)?;
        hyperparameters.validate()?;

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let tower = EmbeddingTower::new(input_len, &hyperparameters, vb.pp("tower"))?;

        debug!(
            input_len,
            embedding_dim = hyperparameters.embedding_dim,
            fc_units = hyperparameters.fc_units,
            num_vars = varmap.all_vars().len(),
            "Built siamese model"
        );

        Ok(Self {
            varmap,
            tower,
            hyperparameters,
            device: device.clone(),
        })
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    pub fn input_len(&self) -> usize {
        self.tower.input_len()
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn tower(&self) -> &EmbeddingTower {
        &self.tower
    }

    /// Trainable variables (the tower's weights; there is no second copy).
    pub fn vars(&self) -> Vec<Var> {
        self.varmap.all_vars()
    }

    /// Returns `false` when any weight is NaN or infinite.
    ///
    /// The tower's ReLUs map NaN to zero, so blown-up weights do not show in the distances.
    pub fn weights_finite(&self) -> Result<bool, ModelError> {
        for var in self.varmap.all_vars() {
            // NaN and infinities survive the sum
            let total = var.as_tensor().sum_all()?.to_scalar::<f32>()?;
            if !total.is_finite() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Contrastive loss bound to this model's margin.
    pub fn loss(&self) -> ContrastiveLoss {
        ContrastiveLoss::for_hyperparameters(&self.hyperparameters)
    }

    fn check_input(&self, xs: &Tensor) -> Result<(), ModelError> {
        let (_, len) = xs.dims2().map_err(|e| ModelError::Shape {
            reason: format!("expected (batch, {}) input: {e}", self.input_len()),
        })?;
        validate_matching_dim(self.input_len(), len)?;
        Ok(())
    }

    /// Embeds a `(batch, input_len)` tensor.
    pub fn embed(&self, xs: &Tensor, train: bool) -> Result<Tensor, ModelError> {
        self.check_input(xs)?;
        Ok(self.tower.forward_t(xs, train)?)
    }

    /// Distances for a batch of pairs, shape `(batch,)`.
    pub fn forward_t(
        &self,
        left: &Tensor,
        right: &Tensor,
        train: bool,
    ) -> Result<Tensor, ModelError> {
        if left.dims() != right.dims() {
            return Err(ModelError::Shape {
                reason: format!(
                    "pair members differ in shape: {:?} vs {:?}",
                    left.dims(),
                    right.dims()
                ),
            });
        }
        let left = self.embed(left, train)?;
        let right = self.embed(right, train)?;
        Ok(euclidean_distance(&left, &right)?)
    }

    /// Inference distance between two single records.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> Result<f32, ModelError> {
        if a.len() != b.len() {
            return Err(ModelError::Shape {
                reason: format!("pair members differ in length: {} vs {}", a.len(), b.len()),
            });
        }
        let left = Tensor::from_slice(a, (1, a.len()), &self.device)?;
        let right = Tensor::from_slice(b, (1, b.len()), &self.device)?;
        let distance = self.forward_t(&left, &right, false)?;
        Ok(distance.to_vec1::<f32>()?[0])
    }

    /// Inference match decisions: `true` when the distance is below `threshold`.
    pub fn predict(
        &self,
        left: &Tensor,
        right: &Tensor,
        threshold: f32,
    ) -> Result<Vec<bool>, ModelError> {
        let distances = self.forward_t(left, right, false)?.to_vec1::<f32>()?;
        Ok(distances.into_iter().map(|d| d < threshold).collect())
    }

    /// Writes the weights as safetensors.
    pub fn save_weights<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        self.varmap
            .save(path.as_ref())
            .map_err(|e| ModelError::SaveFailed {
                reason: e.to_string(),
            })
    }
}
