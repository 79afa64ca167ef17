use rand::Rng;

use crate::model::Hyperparameters;

/// Discrete choices for every tunable hyperparameter.
///
/// Immutable once handed to a [`Tuner`](super::Tuner); the search never reads anything
/// outside it.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSpace {
    pub embedding_dim: Vec<usize>,
    pub lstm_units: Vec<usize>,
    pub fc_units: Vec<usize>,
    pub dropout_rate: Vec<f32>,
    pub learning_rate: Vec<f64>,
    pub margin: Vec<f32>,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            embedding_dim: vec![32, 64, 128],
            lstm_units: vec![64, 128, 256],
            fc_units: vec![32, 64, 128],
            dropout_rate: vec![0.1, 0.2, 0.3],
            learning_rate: vec![0.001, 0.0001],
            margin: vec![0.5, 1.0, 1.5],
        }
    }
}

impl SearchSpace {
    /// A space with exactly one choice per dimension.
    pub fn single(hp: Hyperparameters) -> Self {
        Self {
            embedding_dim: vec![hp.embedding_dim],
            lstm_units: vec![hp.lstm_units],
            fc_units: vec![hp.fc_units],
            dropout_rate: vec![hp.dropout_rate],
            learning_rate: vec![hp.learning_rate],
            margin: vec![hp.margin],
        }
    }

    /// `true` if any dimension has no choices.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Number of distinct configurations.
    pub fn size(&self) -> usize {
        self.embedding_dim.len()
            * self.lstm_units.len()
            * self.fc_units.len()
            * self.dropout_rate.len()
            * self.learning_rate.len()
            * self.margin.len()
    }

    pub fn contains(&self, hp: &Hyperparameters) -> bool {
        self.embedding_dim.contains(&hp.embedding_dim)
            && self.lstm_units.contains(&hp.lstm_units)
            && self.fc_units.contains(&hp.fc_units)
            && self.dropout_rate.contains(&hp.dropout_rate)
            && self.learning_rate.contains(&hp.learning_rate)
            && self.margin.contains(&hp.margin)
    }

    /// Draws one configuration uniformly per dimension. `None` if the space is empty.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Hyperparameters> {
        if self.is_empty() {
            return None;
        }
        Some(Hyperparameters {
            embedding_dim: pick(&self.embedding_dim, rng),
            lstm_units: pick(&self.lstm_units, rng),
            fc_units: pick(&self.fc_units, rng),
            dropout_rate: pick(&self.dropout_rate, rng),
            learning_rate: pick(&self.learning_rate, rng),
            margin: pick(&self.margin, rng),
        })
    }
}

fn pick<T: Copy, R: Rng + ?Sized>(values: &[T], rng: &mut R) -> T {
    values[rng.random_range(0..values.len())]
}
