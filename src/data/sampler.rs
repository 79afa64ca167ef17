use std::collections::HashSet;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use super::error::DataError;
use super::pairs::{FeatureVector, Pair, PairSet};

/// Attempts per requested negative before giving up (tiny or single-entity inputs).
const NEGATIVE_ATTEMPTS: usize = 32;

/// Builds labelled pairs from records tagged with entity ids.
#[derive(Debug, Clone)]
pub struct PairSampler {
    seed: u64,
}

impl PairSampler {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Every same-entity pair (label 1) plus up to `negatives_per_positive` random
    /// cross-entity pairs per positive (label 0). Record-index pairs are never repeated.
    pub fn sample(
        &self,
        records: &[FeatureVector],
        entity_ids: &[u64],
        negatives_per_positive: usize,
    ) -> Result<PairSet, DataError> {
        if records.len() != entity_ids.len() {
            return Err(DataError::LengthMismatch {
                pairs: records.len(),
                labels: entity_ids.len(),
            });
        }

        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut pairs = Vec::new();

        for i in 0..records.len() {
            for j in (i + 1)..records.len() {
                if entity_ids[i] == entity_ids[j] {
                    seen.insert((i, j));
                    pairs.push(Self::pair(records, i, j, 1));
                }
            }
        }
        let positives = pairs.len();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let wanted = positives * negatives_per_positive;
        let mut negatives = 0;
        let mut attempts = 0;
        while negatives < wanted && attempts < wanted * NEGATIVE_ATTEMPTS {
            attempts += 1;
            let a = rng.random_range(0..records.len());
            let b = rng.random_range(0..records.len());
            let key = (a.min(b), a.max(b));
            if entity_ids[a] == entity_ids[b] || !seen.insert(key) {
                continue;
            }
            pairs.push(Self::pair(records, key.0, key.1, 0));
            negatives += 1;
        }

        debug!(
            records = records.len(),
            positives,
            negatives,
            "Sampled record pairs"
        );

        PairSet::new(pairs)
    }

    fn pair(records: &[FeatureVector], i: usize, j: usize, label: u8) -> Pair {
        Pair {
            left: records[i].clone(),
            right: records[j].clone(),
            label,
        }
    }
}
