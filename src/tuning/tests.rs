use super::*;
use crate::data::{FeatureVector, PairDataset, PairSet};
use crate::model::{Hyperparameters, ModelError};
use crate::training::{CancelFlag, Trainer, TrainerConfig, TrainingError, TrainingResult};
use candle_core::Device;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn tuner(runner: MockTrialRunner) -> Tuner<MockTrialRunner> {
    Tuner::new(SearchSpace::default(), HyperbandConfig::default(), runner).unwrap()
}

fn diverged(epoch: usize) -> TrainingError {
    TrainingError::Diverged {
        epoch,
        batch: 0,
        reason: "loss = NaN".to_string(),
    }
}

fn record(trial_id: usize, round: usize, val_accuracy: f64) -> TrialRecord {
    TrialRecord {
        trial_id,
        iteration: 0,
        bracket: 0,
        round,
        hyperparameters: Hyperparameters::default(),
        epochs: 1,
        val_accuracy,
        status: TrialStatus::Completed,
    }
}

mod schedule_tests {
    use super::*;

    #[test]
    fn test_default_brackets() {
        let config = HyperbandConfig::default();
        assert_eq!(config.max_bracket(), 2);

        let brackets = config.brackets();
        let populations: Vec<usize> = brackets.iter().map(|b| b.population()).collect();
        assert_eq!(populations, vec![9, 5, 3]);

        let epochs: Vec<Vec<usize>> = brackets
            .iter()
            .map(|b| b.rounds.iter().map(|r| r.epochs).collect())
            .collect();
        assert_eq!(epochs, vec![vec![3, 7, 20], vec![7, 20], vec![20]]);

        let candidates: Vec<usize> = brackets[0].rounds.iter().map(|r| r.candidates).collect();
        assert_eq!(candidates, vec![9, 3, 1]);
        assert_eq!(brackets[0].rounds.last().unwrap().keep, 0);
    }

    #[test]
    fn test_single_epoch_budget() {
        let config = HyperbandConfig::default().with_max_epochs(1);
        assert_eq!(config.max_bracket(), 0);
        let brackets = config.brackets();
        assert_eq!(brackets.len(), 1);
        assert_eq!(
            brackets[0].rounds,
            vec![RoundPlan {
                epochs: 1,
                candidates: 1,
                keep: 0
            }]
        );
    }

    #[test]
    fn test_exact_power_budget() {
        // 9 = 3^2
        let config = HyperbandConfig::default().with_max_epochs(9);
        assert_eq!(config.max_bracket(), 2);
        let first = &config.brackets()[0];
        let epochs: Vec<usize> = first.rounds.iter().map(|r| r.epochs).collect();
        assert_eq!(epochs, vec![1, 3, 9]);
    }

    #[test]
    fn test_invalid_config() {
        let bad = [
            HyperbandConfig::default().with_max_epochs(0),
            HyperbandConfig::default().with_iterations(0),
            HyperbandConfig {
                factor: 1,
                ..Default::default()
            },
        ];
        for config in bad {
            let err = Tuner::new(SearchSpace::default(), config, MockTrialRunner::constant(0.5))
                .unwrap_err();
            assert!(matches!(err, TuningError::InvalidConfig { .. }));
        }
    }
}

mod space_tests {
    use super::*;

    #[test]
    fn test_default_space() {
        let space = SearchSpace::default();
        assert_eq!(space.size(), 3 * 3 * 3 * 3 * 2 * 3);
        assert!(!space.is_empty());
        assert!(space.contains(&Hyperparameters::default()));
        assert!(!space.contains(&Hyperparameters {
            embedding_dim: 48,
            ..Default::default()
        }));
    }

    #[test]
    fn test_samples_are_members() {
        let space = SearchSpace::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let hp = space.sample(&mut rng).unwrap();
            assert!(space.contains(&hp));
        }
    }

    #[test]
    fn test_empty_dimension() {
        let space = SearchSpace {
            margin: vec![],
            ..Default::default()
        };
        assert!(space.is_empty());
        assert_eq!(space.sample(&mut StdRng::seed_from_u64(0)), None);
    }

    #[test]
    fn test_single_space() {
        let hp = Hyperparameters::default();
        let space = SearchSpace::single(hp);
        assert_eq!(space.size(), 1);
        assert_eq!(space.sample(&mut StdRng::seed_from_u64(3)), Some(hp));
    }
}

mod selection_tests {
    use super::*;

    #[test]
    fn test_highest_score_wins() {
        let records = vec![record(0, 0, 0.4), record(1, 0, 0.9), record(2, 0, 0.7)];
        assert_eq!(select_best(&records).unwrap().trial_id, 1);
    }

    #[test]
    fn test_ties_break_on_lowest_trial_id_in_any_order() {
        let mut records = vec![record(5, 0, 0.8), record(2, 1, 0.8), record(9, 0, 0.8)];
        assert_eq!(select_best(&records).unwrap().trial_id, 2);
        records.reverse();
        assert_eq!(select_best(&records).unwrap().trial_id, 2);
    }

    #[test]
    fn test_failed_records_are_ignored() {
        let mut failed = record(0, 0, f64::NEG_INFINITY);
        failed.status = TrialStatus::Diverged;
        assert!(select_best(&[failed.clone()]).is_none());
        assert_eq!(select_best(&[failed, record(1, 0, 0.1)]).unwrap().trial_id, 1);
    }
}

mod search_tests {
    use super::*;

    #[test]
    fn test_result_is_drawn_from_space() {
        let mut tuner = tuner(MockTrialRunner::new(|hp, epochs| {
            Ok(hp.embedding_dim as f64 / 128.0 + epochs as f64 / 1000.0)
        }));
        let outcome = tuner.search().unwrap();

        assert!(tuner.space().contains(&outcome.best));
        // 2 iterations of brackets 9 + 5 + 3
        assert_eq!(tuner.runner().started().len(), 34);
        // rounds per iteration: (9 + 3 + 1) + (5 + 1) + 3
        assert_eq!(outcome.history.len(), 44);
        assert_eq!(tuner.history(), outcome.history.as_slice());

        let max = outcome
            .history
            .iter()
            .map(|r| r.val_accuracy)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(outcome.best_score, max);
        assert_eq!(outcome.best, select_best(&outcome.history).unwrap().hyperparameters);
    }

    #[test]
    fn test_constant_scores_pick_first_trial() {
        let mut tuner = tuner(MockTrialRunner::constant(0.5));
        let outcome = tuner.search().unwrap();
        assert_eq!(outcome.best_trial_id, 0);
        assert_eq!(outcome.best, tuner.runner().started()[0]);
    }

    #[test]
    fn test_bracket_population_is_distinct() {
        let mut tuner = tuner(MockTrialRunner::constant(0.5));
        tuner.search().unwrap();
        let first_bracket: HashSet<String> = tuner.runner().started()[..9]
            .iter()
            .map(|hp| hp.to_string())
            .collect();
        assert_eq!(first_bracket.len(), 9);
    }

    #[test]
    fn test_search_is_deterministic_for_seed() {
        let score = |hp: &Hyperparameters, _: usize| -> TrainingResult<f64> {
            Ok(hp.fc_units as f64 * hp.margin as f64)
        };
        let a = tuner(MockTrialRunner::new(score)).search().unwrap();
        let b = tuner(MockTrialRunner::new(score)).search().unwrap();
        assert_eq!(a.best, b.best);
        assert_eq!(a.history, b.history);
    }

    #[test]
    fn test_survivors_advance_on_cumulative_epochs() {
        let config = HyperbandConfig::default().with_iterations(1);
        let mut tuner =
            Tuner::new(SearchSpace::default(), config, MockTrialRunner::constant(0.5)).unwrap();
        let outcome = tuner.search().unwrap();

        let first_bracket: Vec<&TrialRecord> =
            outcome.history.iter().filter(|r| r.bracket == 2).collect();
        let rounds: Vec<(usize, usize)> = first_bracket.iter().map(|r| (r.round, r.epochs)).collect();
        assert_eq!(rounds.iter().filter(|&&(round, _)| round == 0).count(), 9);
        assert_eq!(rounds.iter().filter(|&&(round, _)| round == 1).count(), 3);
        assert!(rounds.contains(&(2, 20)));

        // survivors of round 0 with equal scores are the lowest ids
        let promoted: Vec<usize> = first_bracket
            .iter()
            .filter(|r| r.round == 1)
            .map(|r| r.trial_id)
            .collect();
        assert_eq!(promoted, vec![0, 1, 2]);
    }

    #[test]
    fn test_diverging_trial_recorded_and_search_completes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut tuner = tuner(MockTrialRunner::new(move |_, epochs| {
            if counter.fetch_add(1, Ordering::SeqCst) % 3 == 0 {
                Err(diverged(epochs))
            } else {
                Ok(0.75)
            }
        }));

        let outcome = tuner.search().unwrap();
        assert!(calls.load(Ordering::SeqCst) > 0);
        assert_eq!(outcome.best_score, 0.75);

        let failed: Vec<&TrialRecord> = outcome
            .history
            .iter()
            .filter(|r| r.status == TrialStatus::Diverged)
            .collect();
        assert!(!failed.is_empty());
        assert!(failed.iter().all(|r| r.val_accuracy == f64::NEG_INFINITY));

        // a diverged trial is never advanced again
        for dead in &failed {
            assert!(
                !outcome
                    .history
                    .iter()
                    .any(|r| r.trial_id == dead.trial_id && r.round > dead.round)
            );
        }
        let best = outcome.history.iter().find(|r| r.trial_id == outcome.best_trial_id);
        assert!(best.unwrap().is_completed());
    }

    #[test]
    fn test_non_finite_score_counts_as_diverged() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut tuner = tuner(MockTrialRunner::new(move |_, _| {
            if counter.fetch_add(1, Ordering::SeqCst) % 4 == 0 {
                Ok(f64::NAN)
            } else {
                Ok(0.6)
            }
        }));
        let outcome = tuner.search().unwrap();
        assert_eq!(outcome.best_score, 0.6);

        let first = &outcome.history[0];
        assert_eq!(first.status, TrialStatus::Diverged);
        assert_eq!(first.val_accuracy, f64::NEG_INFINITY);
    }

    #[test]
    fn test_every_trial_failing_is_exhausted() {
        let mut tuner = tuner(MockTrialRunner::new(|_, epochs| Err(diverged(epochs))));
        let err = tuner.search().unwrap_err();
        assert!(matches!(err, TuningError::ConfigurationExhausted { .. }));
        // first bracket: all 9 candidates recorded before giving up
        assert_eq!(tuner.history().len(), 9);
        assert!(tuner.history().iter().all(|r| !r.is_completed()));
    }

    #[test]
    fn test_generic_failure_is_failed_status() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut tuner = tuner(MockTrialRunner::new(move |_, _| {
            if counter.fetch_add(1, Ordering::SeqCst) % 5 == 1 {
                Err(TrainingError::EmptyDataset { split: "training" })
            } else {
                Ok(0.5)
            }
        }));
        let outcome = tuner.search().unwrap();
        let second = &outcome.history[1];
        assert_eq!(second.trial_id, 1);
        assert_eq!(second.status, TrialStatus::Failed);
        assert_eq!(second.val_accuracy, f64::NEG_INFINITY);
    }

    #[test]
    fn test_empty_space_is_exhausted() {
        let space = SearchSpace {
            fc_units: vec![],
            ..Default::default()
        };
        let mut tuner =
            Tuner::new(space, HyperbandConfig::default(), MockTrialRunner::constant(0.5)).unwrap();
        let err = tuner.search().unwrap_err();
        assert!(matches!(err, TuningError::ConfigurationExhausted { .. }));
        assert!(tuner.runner().started().is_empty());
    }

    #[test]
    fn test_small_space_allows_duplicates() {
        let space = SearchSpace::single(Hyperparameters::default());
        let mut tuner =
            Tuner::new(space, HyperbandConfig::default(), MockTrialRunner::constant(0.5)).unwrap();
        let outcome = tuner.search().unwrap();
        assert_eq!(outcome.best, Hyperparameters::default());
        assert_eq!(tuner.runner().started().len(), 34);
    }
}

mod cancel_tests {
    use super::*;

    #[test]
    fn test_cancel_before_search() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let mut tuner = tuner(MockTrialRunner::constant(0.5)).with_cancel(cancel);
        let err = tuner.search().unwrap_err();
        assert!(matches!(err, TuningError::Cancelled { recorded_trials: 0 }));
        assert_eq!(tuner.runner().advance_calls(), 0);
    }

    #[test]
    fn test_cancel_mid_search_keeps_history() {
        let cancel = CancelFlag::new();
        let trigger = cancel.clone();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut tuner = tuner(MockTrialRunner::new(move |_, _| {
            if counter.fetch_add(1, Ordering::SeqCst) == 4 {
                trigger.cancel();
            }
            Ok(0.5)
        }))
        .with_cancel(cancel);

        let err = tuner.search().unwrap_err();
        let TuningError::Cancelled { recorded_trials } = err else {
            panic!("expected cancellation, got {err}");
        };
        assert!(recorded_trials >= 5);
        assert_eq!(recorded_trials, tuner.history().len());
        // the round in progress finishes, no later round starts
        assert!(tuner.history().iter().all(|r| r.round == 0));
    }

    #[test]
    fn test_cancel_reported_by_runner() {
        let mut tuner = tuner(MockTrialRunner::new(|_, _| {
            Err(TrainingError::Cancelled {
                completed_epochs: 1,
            })
        }));
        let err = tuner.search().unwrap_err();
        assert!(matches!(err, TuningError::Cancelled { recorded_trials: 0 }));
    }
}

mod outcome_tests {
    use super::*;

    #[test]
    fn test_outcome_serializes() {
        let mut failed = record(1, 0, f64::NEG_INFINITY);
        failed.status = TrialStatus::Diverged;
        let outcome = SearchOutcome {
            best: Hyperparameters::default(),
            best_trial_id: 0,
            best_score: 0.5,
            history: vec![record(0, 0, 0.5), failed],
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["best"]["embedding_dim"], 64);
        assert_eq!(json["history"][1]["status"], "diverged");
        assert!(json["history"][1]["val_accuracy"].is_null());
        assert_eq!(json["history"][0]["status"], "completed");
    }
}

mod siamese_runner_tests {
    use super::*;

    const DIM: usize = 12;

    fn entity(id: usize, jitter: f32) -> FeatureVector {
        (0..DIM)
            .map(|i| ((id * 5 + i * 3) % 13) as f32 / 13.0 + jitter)
            .collect()
    }

    fn set(n: usize, offset: usize, dim: usize) -> PairSet {
        let mut arrays = Vec::new();
        let mut labels = Vec::new();
        for i in 0..n {
            let id = i + offset;
            let a: FeatureVector = entity(id, 0.0).into_iter().take(dim).collect();
            let b: FeatureVector = if i % 2 == 0 {
                entity(id, 0.02).into_iter().take(dim).collect()
            } else {
                entity(id + 3, 0.0).into_iter().take(dim).collect()
            };
            arrays.push([a, b]);
            labels.push(u8::from(i % 2 == 0));
        }
        PairSet::from_arrays(arrays, labels).unwrap()
    }

    fn small_hp() -> Hyperparameters {
        Hyperparameters {
            embedding_dim: 32,
            lstm_units: 64,
            fc_units: 32,
            dropout_rate: 0.1,
            learning_rate: 0.001,
            margin: 1.0,
        }
    }

    fn trainer() -> Trainer {
        Trainer::new(TrainerConfig::default().with_batch_size(4)).unwrap()
    }

    #[test]
    fn test_real_search_single_bracket() {
        let dataset = PairDataset::new(set(8, 0, DIM), set(4, 40, DIM)).unwrap();
        let runner = SiameseTrialRunner::new(&dataset, Device::Cpu, trainer());
        let config = HyperbandConfig::default()
            .with_max_epochs(2)
            .with_iterations(1);
        let mut tuner = Tuner::new(SearchSpace::single(small_hp()), config, runner).unwrap();

        let outcome = tuner.search().unwrap();
        assert_eq!(outcome.best, small_hp());
        assert!((0.0..=1.0).contains(&outcome.best_score));
        assert!(outcome.history.iter().all(|r| r.is_completed()));
    }

    #[test]
    fn test_real_diverging_trial_scores_worst() {
        let dataset = PairDataset::new(set(8, 0, DIM), set(4, 40, DIM)).unwrap();
        let runner = SiameseTrialRunner::new(&dataset, Device::Cpu, trainer());
        let mut space = SearchSpace::single(small_hp());
        space.learning_rate = vec![0.001, 1e39];
        let config = HyperbandConfig::default()
            .with_max_epochs(3)
            .with_iterations(1);
        let mut tuner = Tuner::new(space, config, runner).unwrap();

        let outcome = tuner.search().unwrap();
        assert_eq!(outcome.best.learning_rate, 0.001);
        assert!(outcome.best_score.is_finite());

        let diverged: Vec<_> = outcome
            .history
            .iter()
            .filter(|r| r.hyperparameters.learning_rate == 1e39)
            .collect();
        assert!(!diverged.is_empty());
        for record in diverged {
            assert_eq!(record.status, TrialStatus::Diverged);
            assert_eq!(record.val_accuracy, f64::NEG_INFINITY);
        }
    }

    #[test]
    fn test_runner_resumes_trial() {
        let dataset = PairDataset::new(set(6, 0, DIM), set(4, 20, DIM)).unwrap();
        let mut runner = SiameseTrialRunner::new(&dataset, Device::Cpu, trainer());
        let cancel = CancelFlag::new();

        let mut trial = runner.start(small_hp()).unwrap();
        assert_eq!(trial.epochs, 0);
        runner.advance(&mut trial, 1, &cancel).unwrap();
        assert_eq!(trial.epochs, 1);
        let score = runner.advance(&mut trial, 3, &cancel).unwrap();
        assert_eq!(trial.epochs, 3);
        assert!((0.0..=1.0).contains(&score));

        // no new epochs: evaluation only
        let again = runner.advance(&mut trial, 3, &cancel).unwrap();
        assert_eq!(trial.epochs, 3);
        assert!((0.0..=1.0).contains(&again));
    }

    #[test]
    fn test_short_input_is_shape_error_before_trials() {
        let dataset = PairDataset::new(set(4, 0, 6), set(2, 10, 6)).unwrap();
        let runner = SiameseTrialRunner::new(&dataset, Device::Cpu, trainer());
        let mut tuner =
            Tuner::new(SearchSpace::default(), HyperbandConfig::default(), runner).unwrap();

        let err = tuner.search().unwrap_err();
        assert!(matches!(err, TuningError::Model(ModelError::Shape { .. })));
        assert!(tuner.history().is_empty());
    }

    #[test]
    fn test_runner_cancel_propagates() {
        let dataset = PairDataset::new(set(6, 0, DIM), set(4, 20, DIM)).unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let runner = SiameseTrialRunner::new(&dataset, Device::Cpu, trainer());
        let config = HyperbandConfig::default()
            .with_max_epochs(1)
            .with_iterations(1);
        let mut tuner = Tuner::new(SearchSpace::single(small_hp()), config, runner)
            .unwrap()
            .with_cancel(cancel);
        assert!(matches!(
            tuner.search().unwrap_err(),
            TuningError::Cancelled { .. }
        ));
    }
}
