//! Bagged ensemble of regression trees.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::common::error::{CropError, CropResult};

use super::tree::{RegressionTree, TreeParams};
use super::Regress;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_estimators: usize,
    #[serde(flatten)]
    pub tree: TreeParams,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            tree: TreeParams::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    seed: u64,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn new(params: ForestParams, seed: u64) -> Self {
        Self {
            params,
            seed,
            trees: Vec::new(),
        }
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

impl Regress for RandomForest {
    /// Each tree sees a bootstrap sample of `n` rows drawn with replacement.
    /// The forest reseeds from `seed` on every fit, so refits are repeatable.
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> CropResult<()> {
        if x.is_empty() || x.len() != y.len() {
            return Err(CropError::insufficient("forest fit needs matching non-empty inputs"));
        }
        if self.params.n_estimators == 0 {
            return Err(CropError::InvalidConfig("forest needs at least one tree".into()));
        }

        let n = x.len();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut trees = Vec::with_capacity(self.params.n_estimators);
        for _ in 0..self.params.n_estimators {
            let sample: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
            let mut tree_rng = StdRng::seed_from_u64(rng.random());
            trees.push(RegressionTree::fit(&self.params.tree, x, y, sample, &mut tree_rng)?);
        }
        self.trees = trees;
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / self.trees.len() as f64
    }

    fn feature_importance(&self) -> Vec<f64> {
        let Some(first) = self.trees.first() else {
            return Vec::new();
        };
        let mut acc = vec![0.0; first.feature_importance().len()];
        for tree in &self.trees {
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
