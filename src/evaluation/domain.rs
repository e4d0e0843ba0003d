//! Metric and report types produced while selecting and scoring models.

use serde::{Deserialize, Serialize};

use crate::training::domain::TargetKind;
use crate::training::models::RegressorKind;

/// Held-out test metrics. R² is `None` when undefined (fewer than two rows
/// or a constant target).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub r2: Option<f64>,
    pub rmse: f64,
    pub mae: f64,
    pub n: usize,
}

/// Cross-validated R² for one candidate family.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CvScore {
    pub kind: RegressorKind,
    /// Scores of the folds where R² was defined.
    pub folds: Vec<f64>,
    /// Folds dropped because R² was undefined on them.
    pub skipped: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
}

impl CvScore {
    pub fn from_folds(kind: RegressorKind, folds: Vec<f64>, skipped: usize) -> Self {
        let (mean, std) = if folds.is_empty() {
            (None, None)
        } else {
            let n = folds.len() as f64;
            let mean = folds.iter().sum::<f64>() / n;
            let var = folds.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
            (Some(mean), Some(var.sqrt()))
        };
        Self {
            kind,
            folds,
            skipped,
            mean,
            std,
        }
    }

    /// A candidate takes part in selection only with a finite mean.
    pub fn is_usable(&self) -> bool {
        self.mean.is_some_and(f64::is_finite)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeight {
    pub feature: String,
    pub weight: f64,
}

/// Per-feature weights of one target's selected model, heaviest first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub target: TargetKind,
    pub family: RegressorKind,
    pub weights: Vec<FeatureWeight>,
}

impl FeatureImportance {
    pub fn top(&self, k: usize) -> &[FeatureWeight] {
        &self.weights[..k.min(self.weights.len())]
    }
}
