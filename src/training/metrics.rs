use serde::Serialize;

/// Number of pairs whose match decision (`distance < threshold`) equals the label.
pub fn correct_predictions(distances: &[f32], labels: &[u8], threshold: f32) -> usize {
    distances
        .iter()
        .zip(labels)
        .filter(|&(&d, &label)| (d < threshold) == (label == 1))
        .count()
}

/// Loss and accuracy over one pass of a pair set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub loss: f32,
    pub accuracy: f32,
}

/// Running, size-weighted totals for one pass.
#[derive(Debug, Default)]
pub(crate) struct Accumulator {
    loss_sum: f64,
    correct: usize,
    seen: usize,
}

impl Accumulator {
    pub(crate) fn record(&mut self, batch_loss: f32, batch_len: usize, correct: usize) {
        self.loss_sum += batch_loss as f64 * batch_len as f64;
        self.correct += correct;
        self.seen += batch_len;
    }

    pub(crate) fn finish(&self) -> Evaluation {
        if self.seen == 0 {
            return Evaluation {
                loss: 0.0,
                accuracy: 0.0,
            };
        }
        Evaluation {
            loss: (self.loss_sum / self.seen as f64) as f32,
            accuracy: self.correct as f32 / self.seen as f32,
        }
    }
}

/// Metrics reported at the end of each epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpochMetrics {
    /// Zero-based epoch index.
    pub epoch: usize,
    pub train_loss: f32,
    pub train_accuracy: f32,
    pub val_loss: f32,
    pub val_accuracy: f32,
}

/// Per-epoch log of a training run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochMetrics>,
}

impl TrainingHistory {
    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }

    /// Validation accuracy of the final epoch.
    pub fn final_val_accuracy(&self) -> Option<f32> {
        self.last().map(|m| m.val_accuracy)
    }

    pub fn best_val_accuracy(&self) -> Option<f32> {
        self.epochs.iter().map(|m| m.val_accuracy).reduce(f32::max)
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }
}
