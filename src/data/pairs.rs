use std::collections::HashSet;
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::error::DataError;

/// Per-record numeric features; every record in a dataset has the same length.
pub type FeatureVector = Vec<f32>;

/// Two records and whether they describe the same entity (`label == 1`).
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub left: FeatureVector,
    pub right: FeatureVector,
    pub label: u8,
}

impl Pair {
    pub fn is_match(&self) -> bool {
        self.label == 1
    }

    /// Bitwise identity of the two records, independent of their order.
    fn key(&self) -> (Vec<u32>, Vec<u32>) {
        let bits = |v: &FeatureVector| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        let (a, b) = (bits(&self.left), bits(&self.right));
        if a <= b { (a, b) } else { (b, a) }
    }
}

/// Labelled pairs sharing one feature length.
#[derive(Debug, Clone, Default)]
pub struct PairSet {
    feature_dim: usize,
    pairs: Vec<Pair>,
}

impl PairSet {
    /// Builds a set from `(N, 2, D)` pair arrays and `(N,)` labels.
    pub fn from_arrays(
        pairs: Vec<[FeatureVector; 2]>,
        labels: Vec<u8>,
    ) -> Result<Self, DataError> {
        if pairs.len() != labels.len() {
            return Err(DataError::LengthMismatch {
                pairs: pairs.len(),
                labels: labels.len(),
            });
        }

        let pairs = pairs
            .into_iter()
            .zip(labels)
            .map(|([left, right], label)| Pair { left, right, label })
            .collect();
        Self::new(pairs)
    }

    /// Validates shapes, feature values and labels.
    pub fn new(pairs: Vec<Pair>) -> Result<Self, DataError> {
        let feature_dim = pairs.first().map(|p| p.left.len()).ok_or(DataError::Empty)?;

        for (index, pair) in pairs.iter().enumerate() {
            for side in [&pair.left, &pair.right] {
                if side.len() != feature_dim {
                    return Err(DataError::ShapeMismatch {
                        expected: feature_dim,
                        actual: side.len(),
                        index,
                    });
                }
                if let Some(&value) = side.iter().find(|v| !v.is_finite()) {
                    return Err(DataError::NonFiniteFeature { value, index });
                }
            }
            if pair.label > 1 {
                return Err(DataError::InvalidLabel {
                    label: pair.label,
                    index,
                });
            }
        }

        Ok(Self { feature_dim, pairs })
    }

    pub fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn get(&self, index: usize) -> Option<&Pair> {
        self.pairs.get(index)
    }

    /// Number of matching pairs.
    pub fn positives(&self) -> usize {
        self.pairs.iter().filter(|p| p.is_match()).count()
    }

    /// Splits into `(train, validation)` by shuffled index; each pair lands in exactly one side.
    pub fn split(self, val_fraction: f64, seed: u64) -> Result<(PairSet, PairSet), DataError> {
        if !(val_fraction > 0.0 && val_fraction < 1.0) {
            return Err(DataError::InvalidFraction {
                fraction: val_fraction,
            });
        }
        if self.pairs.len() < 2 {
            return Err(DataError::Empty);
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut pairs = self.pairs;
        pairs.shuffle(&mut rng);

        let val_count =
            ((pairs.len() as f64 * val_fraction).ceil() as usize).clamp(1, pairs.len() - 1);
        let val_pairs = pairs.split_off(pairs.len() - val_count);

        debug!(
            train = pairs.len(),
            validation = val_pairs.len(),
            "Split pair set"
        );

        Ok((
            PairSet {
                feature_dim: self.feature_dim,
                pairs,
            },
            PairSet {
                feature_dim: self.feature_dim,
                pairs: val_pairs,
            },
        ))
    }
}

/// Training and validation pairs with a common feature length.
#[derive(Debug, Clone)]
pub struct PairDataset {
    pub train: PairSet,
    pub validation: PairSet,
}

#[derive(Debug, Deserialize)]
struct PairDatasetFile {
    pairs_train: Vec<[FeatureVector; 2]>,
    labels_train: Vec<u8>,
    pairs_val: Vec<[FeatureVector; 2]>,
    labels_val: Vec<u8>,
}

impl PairDataset {
    /// Pairs the two splits; warns when a pair appears in both.
    pub fn new(train: PairSet, validation: PairSet) -> Result<Self, DataError> {
        if train.feature_dim() != validation.feature_dim() {
            return Err(DataError::ShapeMismatch {
                expected: train.feature_dim(),
                actual: validation.feature_dim(),
                index: 0,
            });
        }
        let dataset = Self { train, validation };

        let overlap = dataset.overlapping_pairs();
        if overlap > 0 {
            warn!(
                overlap,
                validation = dataset.validation.len(),
                "Validation pairs also present in training; validation accuracy is optimistic"
            );
        }
        Ok(dataset)
    }

    /// Number of validation pairs whose two records also form a training pair, in either order.
    pub fn overlapping_pairs(&self) -> usize {
        let train: HashSet<_> = self.train.pairs.iter().map(Pair::key).collect();
        self.validation
            .pairs
            .iter()
            .filter(|p| train.contains(&p.key()))
            .count()
    }

    pub fn feature_dim(&self) -> usize {
        self.train.feature_dim()
    }

    /// Parses `{pairs_train, labels_train, pairs_val, labels_val}` JSON.
    pub fn from_json_str(json: &str) -> Result<Self, DataError> {
        let file: PairDatasetFile = serde_json::from_str(json)?;
        let train = PairSet::from_arrays(file.pairs_train, file.labels_train)?;
        let validation = PairSet::from_arrays(file.pairs_val, file.labels_val)?;
        Self::new(train, validation)
    }

    /// Reads a JSON dataset from disk.
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let dataset = Self::from_json_str(&content)?;

        info!(
            path = %path.display(),
            train = dataset.train.len(),
            validation = dataset.validation.len(),
            feature_dim = dataset.feature_dim(),
            "Loaded pair dataset"
        );

        Ok(dataset)
    }
}
