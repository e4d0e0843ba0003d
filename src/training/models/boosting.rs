//! Least-squares gradient boosting over shallow regression trees.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::common::error::{CropError, CropResult};

use super::tree::{RegressionTree, TreeParams};
use super::Regress;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Share of rows drawn, without replacement, for each stage. `1.0`
    /// fits every stage on all rows and leaves the seed unused.
    pub subsample: f64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            subsample: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    params: BoostingParams,
    seed: u64,
    init: f64,
    stages: Vec<RegressionTree>,
}

impl GradientBoosting {
    pub fn new(params: BoostingParams, seed: u64) -> Self {
        Self {
            params,
            seed,
            init: 0.0,
            stages: Vec::new(),
        }
    }

    pub fn stages(&self) -> &[RegressionTree] {
        &self.stages
    }
}

impl Regress for GradientBoosting {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> CropResult<()> {
        if x.is_empty() || x.len() != y.len() {
            return Err(CropError::insufficient("boosting fit needs matching non-empty inputs"));
        }
        let lr = self.params.learning_rate;
        if self.params.n_estimators == 0 || lr.is_nan() || lr <= 0.0 {
            return Err(CropError::InvalidConfig(
                "boosting needs at least one stage and a positive learning rate".into(),
            ));
        }
        let subsample = self.params.subsample;
        if subsample.is_nan() || subsample <= 0.0 || subsample > 1.0 {
            return Err(CropError::InvalidConfig(
                "boosting.subsample must lie in (0, 1]".into(),
            ));
        }

        let tree_params = TreeParams {
            max_depth: Some(self.params.max_depth),
            ..TreeParams::default()
        };
        let n = x.len();
        let init = y.iter().sum::<f64>() / n as f64;
        let mut current = vec![init; n];
        let n_rows = ((n as f64 * subsample).ceil() as usize).clamp(1, n);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut stages = Vec::with_capacity(self.params.n_estimators);

        for _ in 0..self.params.n_estimators {
            let residual: Vec<f64> = y.iter().zip(&current).map(|(t, f)| t - f).collect();
            let rows = if n_rows < n {
                index::sample(&mut rng, n, n_rows).into_vec()
            } else {
                (0..n).collect()
            };
            let tree = RegressionTree::fit(&tree_params, x, &residual, rows, &mut rng)?;
            for (f, row) in current.iter_mut().zip(x) {
                *f += self.params.learning_rate * tree.predict_row(row);
            }
            stages.push(tree);
        }

        self.init = init;
        self.stages = stages;
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        self.stages
            .iter()
            .fold(self.init, |acc, t| acc + self.params.learning_rate * t.predict_row(row))
    }

    fn feature_importance(&self) -> Vec<f64> {
        let Some(first) = self.stages.first() else {
            return Vec::new();
        };
        let mut acc = vec![0.0; first.feature_importance().len()];
        for tree in &self.stages {
            for (a, v) in acc.iter_mut().zip(tree.feature_importance()) {
                *a += v;
            }
        }
        let total: f64 = acc.iter().sum();
        if total > 0.0 {
            for a in &mut acc {
                *a /= total;
            }
        }
        acc
    }
}
