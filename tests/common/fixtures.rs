//! Synthetic records and pair datasets shared by integration tests.

use twin::{FeatureVector, Hyperparameters, PairSet};

pub const FEATURE_DIM: usize = 12;

/// Deterministic record for entity `id`, shifted by `jitter`.
pub fn record(id: usize, jitter: f32) -> FeatureVector {
    (0..FEATURE_DIM)
        .map(|i| ((id * 7 + i * 5) % 17) as f32 / 17.0 + jitter)
        .collect()
}

/// `n` pairs alternating match (jittered copy) and non-match (different entity).
pub fn pair_arrays(n: usize, offset: usize) -> (Vec<[FeatureVector; 2]>, Vec<u8>) {
    (0..n)
        .map(|i| {
            let id = i + offset;
            if i % 2 == 0 {
                ([record(id, 0.0), record(id, 0.01)], 1)
            } else {
                ([record(id, 0.0), record(id + 4, 0.0)], 0)
            }
        })
        .unzip()
}

pub fn pair_set(n: usize, offset: usize) -> PairSet {
    let (pairs, labels) = pair_arrays(n, offset);
    PairSet::from_arrays(pairs, labels).unwrap()
}

/// `{pairs_train, labels_train, pairs_val, labels_val}` document.
pub fn dataset_json(train: usize, val: usize) -> String {
    let (pairs_train, labels_train) = pair_arrays(train, 0);
    let (pairs_val, labels_val) = pair_arrays(val, 100);
    serde_json::json!({
        "pairs_train": pairs_train,
        "labels_train": labels_train,
        "pairs_val": pairs_val,
        "labels_val": labels_val,
    })
    .to_string()
}

pub fn small_hp() -> Hyperparameters {
    Hyperparameters {
        embedding_dim: 32,
        lstm_units: 64,
        fc_units: 32,
        dropout_rate: 0.1,
        learning_rate: 0.001,
        margin: 1.0,
    }
}
