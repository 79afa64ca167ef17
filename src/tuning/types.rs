use serde::Serialize;

use crate::model::Hyperparameters;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialStatus {
    Completed,
    /// Loss became non-finite while training.
    Diverged,
    /// Building or training failed for any other reason.
    Failed,
}

/// One trial round: a configuration trained up to `epochs` and its score.
///
/// Failed rounds carry `f64::NEG_INFINITY`, which serializes to JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialRecord {
    pub trial_id: usize,
    pub iteration: usize,
    pub bracket: usize,
    pub round: usize,
    pub hyperparameters: Hyperparameters,
    pub epochs: usize,
    pub val_accuracy: f64,
    pub status: TrialStatus,
}

impl TrialRecord {
    pub fn is_completed(&self) -> bool {
        self.status == TrialStatus::Completed
    }
}

/// Result of a completed search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub best: Hyperparameters,
    pub best_trial_id: usize,
    pub best_score: f64,
    pub history: Vec<TrialRecord>,
}

/// Best completed record: highest score, then lowest trial id, then earliest round.
///
/// Depends only on the set of records, not their order.
pub fn select_best(records: &[TrialRecord]) -> Option<&TrialRecord> {
    records
        .iter()
        .filter(|r| r.is_completed() && r.val_accuracy.is_finite())
        .reduce(|best, r| {
            let better = r.val_accuracy > best.val_accuracy
                || (r.val_accuracy == best.val_accuracy
                    && (r.trial_id, r.round) < (best.trial_id, best.round));
            if better { r } else { best }
        })
}
