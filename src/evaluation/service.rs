//! Regression metrics, k-fold cross-validation and importance ranking.

use std::ops::Range;

use crate::common::error::{CropError, CropResult};
use crate::training::domain::{TargetKind, TrainConfig};
use crate::training::models::{Regress, Regressor, RegressorKind};

use super::domain::{CvScore, FeatureImportance, FeatureWeight, RegressionMetrics};

fn mean(v: &[f64]) -> f64 {
    v.iter().sum::<f64>() / v.len() as f64
}

/// Coefficient of determination; `None` when fewer than two rows or the
/// truth has no variance.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> Option<f64> {
    if y_true.len() < 2 || y_true.len() != y_pred.len() {
        return None;
    }
    let m = mean(y_true);
    let ss_tot: f64 = y_true.iter().map(|t| (t - m).powi(2)).sum();
    let magnitude: f64 = y_true.iter().map(|t| t * t).sum();
    if ss_tot <= magnitude * 1e-20 {
        return None;
    }
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let r2 = 1.0 - ss_res / ss_tot;
    r2.is_finite().then_some(r2)
}

pub fn rmse(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let mse = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / y_true.len() as f64;
    mse.sqrt()
}

pub fn mae(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / y_true.len() as f64
}

pub fn evaluate(y_true: &[f64], y_pred: &[f64]) -> RegressionMetrics {
    RegressionMetrics {
        r2: r2_score(y_true, y_pred),
        rmse: rmse(y_true, y_pred),
        mae: mae(y_true, y_pred),
        n: y_true.len(),
    }
}

/// Contiguous, unshuffled folds; the first `n % k` folds take one extra row.
pub fn kfold(n: usize, k: usize) -> CropResult<Vec<Range<usize>>> {
    if k < 2 || n < k {
        return Err(CropError::insufficient(format!(
            "{n} rows cannot be split into {k} folds"
        )));
    }
    let base = n / k;
    let extra = n % k;
    let mut start = 0;
    Ok((0..k)
        .map(|fold| {
            let len = base + usize::from(fold < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .collect())
}

fn take_rows<T: Clone>(src: &[T], range: &Range<usize>, inside: bool) -> Vec<T> {
    src.iter()
        .enumerate()
        .filter(|(i, _)| range.contains(i) == inside)
        .map(|(_, v)| v.clone())
        .collect()
}

/// Score one family on the given folds. Every fold refits a fresh model.
/// Folds whose R² is undefined are counted in `skipped`, not scored.
pub fn cross_validate(
    kind: RegressorKind,
    cfg: &TrainConfig,
    x: &[Vec<f64>],
    y: &[f64],
    folds: &[Range<usize>],
) -> CropResult<CvScore> {
    let mut scores = Vec::with_capacity(folds.len());
    let mut skipped = 0;
    for fold in folds {
        let x_fit = take_rows(x, fold, false);
        let y_fit = take_rows(y, fold, false);
        let x_val = take_rows(x, fold, true);
        let y_val = take_rows(y, fold, true);

        let mut model = kind.build(cfg);
        model.fit(&x_fit, &y_fit)?;
        match r2_score(&y_val, &model.predict(&x_val)) {
            Some(score) => scores.push(score),
            None => skipped += 1,
        }
    }
    Ok(CvScore::from_folds(kind, scores, skipped))
}

/// Rank `model`'s feature weights against the column names, heaviest first.
/// Equal weights keep column order.
pub fn importance(target: TargetKind, model: &Regressor, names: &[String]) -> FeatureImportance {
    let mut weights: Vec<FeatureWeight> = names
        .iter()
        .zip(model.feature_importance())
        .map(|(feature, weight)| FeatureWeight {
            feature: feature.clone(),
            weight,
        })
        .collect();
    weights.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    FeatureImportance {
        target,
        family: model.kind(),
        weights,
    }
}
