use candle_core::{Device, Tensor};
use rand::Rng;

use super::pairs::PairSet;

/// Streaming shuffle over a bounded buffer.
///
/// The first `capacity` items fill the buffer; each call then emits a uniformly chosen
/// buffered item and refills from the source. With `capacity >= len` this is a full shuffle.
pub struct ShuffleBuffer<'a, I: Iterator, R: Rng> {
    source: I,
    buffer: Vec<I::Item>,
    capacity: usize,
    rng: &'a mut R,
}

impl<'a, I: Iterator, R: Rng> ShuffleBuffer<'a, I, R> {
    pub fn new(source: I, capacity: usize, rng: &'a mut R) -> Self {
        let capacity = capacity.max(1);
        Self {
            source,
            buffer: Vec::with_capacity(capacity),
            capacity,
            rng,
        }
    }
}

impl<I: Iterator, R: Rng> Iterator for ShuffleBuffer<'_, I, R> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        while self.buffer.len() < self.capacity {
            match self.source.next() {
                Some(item) => self.buffer.push(item),
                None => break,
            }
        }
        if self.buffer.is_empty() {
            return None;
        }
        let index = self.rng.random_range(0..self.buffer.len());
        Some(self.buffer.swap_remove(index))
    }
}

/// Index batches in dataset order (validation).
pub fn sequential_batches(len: usize, batch_size: usize) -> Vec<Vec<usize>> {
    let indices: Vec<usize> = (0..len).collect();
    indices
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// Index batches drawn through a [`ShuffleBuffer`] (training).
pub fn shuffled_batches<R: Rng>(
    len: usize,
    batch_size: usize,
    buffer_size: usize,
    rng: &mut R,
) -> Vec<Vec<usize>> {
    let order: Vec<usize> = ShuffleBuffer::new(0..len, buffer_size, rng).collect();
    order
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// Device tensors for one mini-batch of pairs.
#[derive(Debug)]
pub struct PairBatch {
    /// `(batch, feature_dim)`
    pub left: Tensor,
    /// `(batch, feature_dim)`
    pub right: Tensor,
    /// `(batch,)` as `f32`
    pub labels: Tensor,
    /// Host copy of the labels, for accuracy.
    pub label_values: Vec<u8>,
}

impl PairBatch {
    /// Gathers `indices` from `set` into tensors on `device`.
    pub fn gather(set: &PairSet, indices: &[usize], device: &Device) -> candle_core::Result<Self> {
        let dim = set.feature_dim();
        let mut left = Vec::with_capacity(indices.len() * dim);
        let mut right = Vec::with_capacity(indices.len() * dim);
        let mut label_values = Vec::with_capacity(indices.len());

        for &index in indices {
            let pair = set.get(index).ok_or_else(|| {
                candle_core::Error::Msg(format!("pair index {index} out of range"))
            })?;
            left.extend_from_slice(&pair.left);
            right.extend_from_slice(&pair.right);
            label_values.push(pair.label);
        }

        let labels: Vec<f32> = label_values.iter().map(|&l| l as f32).collect();
        Ok(Self {
            left: Tensor::from_vec(left, (indices.len(), dim), device)?,
            right: Tensor::from_vec(right, (indices.len(), dim), device)?,
            labels: Tensor::from_vec(labels, indices.len(), device)?,
            label_values,
        })
    }

    pub fn len(&self) -> usize {
        self.label_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.label_values.is_empty()
    }
}
