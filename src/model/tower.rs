use candle_core::{D, Result, Tensor};
use candle_nn::{Conv1d, Conv1dConfig, Dropout, Linear, Module, VarBuilder};

use crate::constants::{
    CONV_KERNEL_SIZE, CONV1_CHANNELS, CONV2_CHANNELS, POOL_WINDOW, validate_feature_dim,
};

use super::error::ModelError;
use super::hyperparams::Hyperparameters;

/// Flattened length after both conv/pool blocks, or `None` if a pooling step would be empty.
pub fn tower_output_len(input_len: usize) -> Option<usize> {
    let mut len = input_len;
    for _ in 0..2 {
        len = len.checked_sub(CONV_KERNEL_SIZE - 1)?;
        len /= POOL_WINDOW;
        if len == 0 {
            return None;
        }
    }
    Some(len * CONV2_CHANNELS)
}

/// Max-pool over the last axis with stride equal to the window; a trailing remainder is dropped.
fn max_pool1d(xs: &Tensor, window: usize) -> Result<Tensor> {
    let (batch, channels, len) = xs.dims3()?;
    let pooled = len / window;
    xs.narrow(2, 0, pooled * window)?
        .reshape((batch, channels, pooled, window))?
        .max(D::Minus1)
}

/// Convolutional feature extractor mapping one record to an embedding.
pub struct EmbeddingTower {
    conv1: Conv1d,
    conv2: Conv1d,
    fc: Linear,
    dropout: Dropout,
    embed: Linear,
    input_len: usize,
    embedding_dim: usize,
}

impl std::fmt::Debug for EmbeddingTower {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingTower")
            .field("input_len", &self.input_len)
            .field("embedding_dim", &self.embedding_dim)
            .finish()
    }
}

impl EmbeddingTower {
    /// Allocates the tower's weights under `vb`.
    ///
    /// Fails with [`ModelError::Shape`] before touching `vb` if `input_len` is too short.
    pub fn new(
        input_len: usize,
        hp: &Hyperparameters,
        vb: VarBuilder,
    ) -> std::result::Result<Self, ModelError> {
        validate_feature_dim(input_len)?;
        let flat_len = tower_output_len(input_len).ok_or_else(|| ModelError::Shape {
            reason: format!("input length {input_len} collapses in the conv/pool stack"),
        })?;

        let conv1 = candle_nn::conv1d(
            1,
            CONV1_CHANNELS,
            CONV_KERNEL_SIZE,
            Conv1dConfig::default(),
            vb.pp("conv1"),
        )?;
        let conv2 = candle_nn::conv1d(
            CONV1_CHANNELS,
            CONV2_CHANNELS,
            CONV_KERNEL_SIZE,
            Conv1dConfig::default(),
            vb.pp("conv2"),
        )?;
        let fc = candle_nn::linear(flat_len, hp.fc_units, vb.pp("fc"))?;
        let embed = candle_nn::linear(hp.fc_units, hp.embedding_dim, vb.pp("embed"))?;

        Ok(Self {
            conv1,
            conv2,
            fc,
            dropout: Dropout::new(hp.dropout_rate),
            embed,
            input_len,
            embedding_dim: hp.embedding_dim,
        })
    }

    pub fn input_len(&self) -> usize {
        self.input_len
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    /// Embeds a `(batch, input_len)` tensor into `(batch, embedding_dim)`.
    ///
    /// Dropout is active only when `train` is set.
    pub fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        let xs = xs.unsqueeze(1)?;
        let xs = max_pool1d(&self.conv1.forward(&xs)?.relu()?, POOL_WINDOW)?;
        let xs = max_pool1d(&self.conv2.forward(&xs)?.relu()?, POOL_WINDOW)?;
        let xs = xs.flatten_from(1)?;
        let xs = self.fc.forward(&xs)?.relu()?;
        let xs = self.dropout.forward(&xs, train)?;
        self.embed.forward(&xs)?.relu()
    }
}
