//! Per-target model selection: split, scale, cross-validate, refit, score.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::common::error::{CropError, CropResult};
use crate::common::time;
use crate::evaluation::domain::CvScore;
use crate::evaluation::service as eval;

use super::domain::{TargetKind, TargetModel, TrainConfig};
use super::models::{Regress, RegressorKind, StandardScaler};

/// Row indices of the held-out and fitting partitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with the split seed; the first `ceil(n × fraction)` rows
/// form the test partition. Both partitions are non-empty when `n >= 2`.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> CropResult<Split> {
    if n < 2 {
        return Err(CropError::insufficient(format!(
            "{n} rows cannot be split into train and test partitions"
        )));
    }
    let n_test = ((n as f64 * test_fraction).ceil() as usize).clamp(1, n - 1);
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    let train = order.split_off(n_test);
    Ok(Split { train, test: order })
}

fn gather<T: Clone>(src: &[T], idx: &[usize]) -> Vec<T> {
    idx.iter().map(|&i| src[i].clone()).collect()
}

fn has_variance(y: &[f64]) -> bool {
    y.iter().any(|v| *v != y[0])
}

pub struct ModelSelector<'a> {
    cfg: &'a TrainConfig,
    candidates: Vec<RegressorKind>,
}

impl<'a> ModelSelector<'a> {
    pub fn new(cfg: &'a TrainConfig) -> Self {
        Self {
            cfg,
            candidates: RegressorKind::ALL.to_vec(),
        }
    }

    /// Restrict the candidate families, keeping the given order for ties.
    pub fn with_candidates(mut self, candidates: &[RegressorKind]) -> Self {
        self.candidates = candidates.to_vec();
        self
    }

    /// Number of folds actually used for `n_train` rows: the configured
    /// count, reduced so each fold holds at least two rows.
    pub fn effective_folds(&self, n_train: usize) -> usize {
        self.cfg.cv_folds.min(n_train / 2)
    }

    pub fn fit(&self, target: TargetKind, x: &[Vec<f64>], y: &[f64]) -> CropResult<TargetModel> {
        let started = Instant::now();
        if x.is_empty() || x.len() != y.len() {
            return Err(CropError::insufficient(format!(
                "{target}: {} feature rows for {} targets",
                x.len(),
                y.len()
            )));
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(CropError::invalid(format!("{target}: non-finite target value")));
        }

        let split = train_test_split(x.len(), self.cfg.test_fraction, self.cfg.seeds.split)?;
        let y_train = gather(y, &split.train);
        let y_test = gather(y, &split.test);
        if !has_variance(&y_train) {
            return Err(CropError::insufficient(format!(
                "{target}: training target has zero variance"
            )));
        }
        let k = self.effective_folds(y_train.len());
        if k < 2 {
            return Err(CropError::insufficient(format!(
                "{target}: {} training rows are too few for cross-validation",
                y_train.len()
            )));
        }

        let scaler = StandardScaler::fit(&gather(x, &split.train))?;
        let x_train = scaler.transform(&gather(x, &split.train))?;
        let x_test = scaler.transform(&gather(x, &split.test))?;
        let folds = eval::kfold(x_train.len(), k)?;

        let mut scores: Vec<CvScore> = Vec::with_capacity(self.candidates.len());
        for kind in &self.candidates {
            match eval::cross_validate(*kind, self.cfg, &x_train, &y_train, &folds) {
                Ok(score) if score.is_usable() => {
                    debug!(
                        ev = "select.cv",
                        target = target.as_str(),
                        family = kind.as_str(),
                        mean = score.mean,
                        std = score.std,
                        skipped = score.skipped
                    );
                    scores.push(score);
                }
                Ok(score) => {
                    warn!(
                        ev = "select.cv_undefined",
                        target = target.as_str(),
                        family = kind.as_str(),
                        skipped = score.skipped
                    );
                    scores.push(score);
                }
                Err(err) => {
                    warn!(
                        ev = "select.cv_failed",
                        target = target.as_str(),
                        family = kind.as_str(),
                        code = err.code() as u32,
                        error = %err
                    );
                }
            }
        }

        let mut best: Option<&CvScore> = None;
        for score in scores.iter().filter(|s| s.is_usable()) {
            let better = match best {
                Some(current) => score.mean > current.mean,
                None => true,
            };
            if better {
                best = Some(score);
            }
        }
        let Some(best) = best else {
            return Err(CropError::insufficient(format!(
                "{target}: no candidate produced a cross-validation score"
            )));
        };

        let mut regressor = best.kind.build(self.cfg);
        regressor.fit(&x_train, &y_train)?;
        let floor = target.floor();
        let served: Vec<f64> = regressor
            .predict(&x_test)
            .into_iter()
            .map(|p| p.max(floor))
            .collect();
        let test = eval::evaluate(&y_test, &served);

        info!(
            ev = "select.done",
            target = target.as_str(),
            family = best.kind.as_str(),
            cv_mean = best.mean,
            test_r2 = test.r2,
            test_rmse = test.rmse,
            folds = k,
            dur_ms = time::elapsed_ms(started)
        );

        Ok(TargetModel {
            target,
            scaler,
            regressor,
            test,
            candidates: scores,
            n_train: split.train.len(),
            n_test: split.test.len(),
        })
    }
}
