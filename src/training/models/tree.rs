//! CART regression tree: squared-error splits, array-backed nodes.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::common::error::{CropError, CropResult};

/// Growth limits shared by the forest and boosting ensembles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    /// `None` grows until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` means all of them.
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub feature: usize,
    pub threshold: f64,
    pub left: usize,
    pub right: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Mean target of the samples that reached this node.
    pub value: f64,
    pub split: Option<Split>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
    importances: Vec<f64>,
}

impl RegressionTree {
    /// Grow a tree on the rows named by `indices` (duplicates allowed, as in a
    /// bootstrap sample). `rng` is only drawn from when `max_features` limits
    /// the candidate features.
    pub fn fit(
        params: &TreeParams,
        x: &[Vec<f64>],
        y: &[f64],
        mut indices: Vec<usize>,
        rng: &mut StdRng,
    ) -> CropResult<Self> {
        let width = x
            .first()
            .map(Vec::len)
            .ok_or_else(|| CropError::insufficient("cannot grow a tree on zero rows"))?;
        if indices.is_empty() || x.len() != y.len() {
            return Err(CropError::insufficient("tree fit needs matching non-empty inputs"));
        }

        let mut builder = Builder {
            x,
            y,
            params,
            rng,
            width,
            nodes: Vec::new(),
            gains: vec![0.0; width],
        };
        builder.grow(&mut indices, 0);

        let total: f64 = builder.gains.iter().sum();
        let importances = if total > 0.0 {
            builder.gains.iter().map(|g| g / total).collect()
        } else {
            builder.gains
        };
        Ok(Self {
            nodes: builder.nodes,
            importances,
        })
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut at = 0;
        loop {
            let node = &self.nodes[at];
            match &node.split {
                Some(split) => {
                    at = if row[split.feature] <= split.threshold {
                        split.left
                    } else {
                        split.right
                    };
                }
                None => return node.value,
            }
        }
    }

    /// Normalized impurity-decrease importance (all zeros for a stump).
    pub fn feature_importance(&self) -> &[f64] {
        &self.importances
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], at: usize) -> usize {
            match &nodes[at].split {
                Some(s) => 1 + walk(nodes, s.left).max(walk(nodes, s.right)),
                None => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

struct Builder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [f64],
    params: &'a TreeParams,
    rng: &'a mut StdRng,
    width: usize,
    nodes: Vec<TreeNode>,
    gains: Vec<f64>,
}

struct Candidate {
    feature: usize,
    threshold: f64,
    position: usize,
    gain: f64,
}

impl Builder<'_> {
    fn grow(&mut self, idx: &mut [usize], depth: usize) -> usize {
        let n = idx.len();
        let mean = idx.iter().map(|&i| self.y[i]).sum::<f64>() / n as f64;
        let sse: f64 = idx.iter().map(|&i| (self.y[i] - mean).powi(2)).sum();

        let at = self.nodes.len();
        self.nodes.push(TreeNode {
            value: mean,
            split: None,
        });

        let depth_reached = self.params.max_depth.is_some_and(|max| depth >= max);
        if depth_reached
            || n < self.params.min_samples_split.max(2)
            || n < 2 * self.params.min_samples_leaf.max(1)
            || sse <= 1e-12 * (1.0 + mean.abs())
        {
            return at;
        }

        let Some(best) = self.best_split(idx, mean, sse) else {
            return at;
        };
        self.gains[best.feature] += best.gain;

        let feature = best.feature;
        let x = self.x;
        idx.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));
        let (left_idx, right_idx) = idx.split_at_mut(best.position);
        let left = self.grow(left_idx, depth + 1);
        let right = self.grow(right_idx, depth + 1);

        self.nodes[at].split = Some(Split {
            feature,
            threshold: best.threshold,
            left,
            right,
        });
        at
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        let mut features: Vec<usize> = (0..self.width).collect();
        match self.params.max_features {
            Some(k) if k < self.width => {
                features.shuffle(&mut *self.rng);
                features.truncate(k.max(1));
                features.sort_unstable();
                features
            }
            _ => features,
        }
    }

    /// Highest SSE reduction over all features and cut points; ties keep the
    /// earliest feature and the lowest threshold.
    fn best_split(&mut self, idx: &[usize], mean: f64, sse: f64) -> Option<Candidate> {
        let n = idx.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let mut best: Option<Candidate> = None;
        let mut order: Vec<usize> = idx.to_vec();

        for feature in self.candidate_features() {
            let x = self.x;
            order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));
            let lo = x[order[0]][feature];
            let hi = x[order[n - 1]][feature];
            if lo == hi {
                continue;
            }

            // Centring on the node mean keeps the running sums small.
            let total: f64 = order.iter().map(|&i| self.y[i] - mean).sum();
            let total_sq: f64 = order.iter().map(|&i| (self.y[i] - mean).powi(2)).sum();
            let mut sum_left = 0.0;
            let mut sq_left = 0.0;

            for pos in 1..n {
                let d = self.y[order[pos - 1]] - mean;
                sum_left += d;
                sq_left += d * d;
                if pos < min_leaf || n - pos < min_leaf {
                    continue;
                }
                let a = x[order[pos - 1]][feature];
                let b = x[order[pos]][feature];
                if a == b {
                    continue;
                }

                let n_left = pos as f64;
                let n_right = (n - pos) as f64;
                let sum_right = total - sum_left;
                let sse_left = sq_left - sum_left * sum_left / n_left;
                let sse_right = (total_sq - sq_left) - sum_right * sum_right / n_right;
                let gain = sse - sse_left.max(0.0) - sse_right.max(0.0);

                if gain > best.as_ref().map_or(0.0, |c| c.gain) {
                    let mut threshold = (a + b) / 2.0;
                    if threshold >= b {
                        threshold = a;
                    }
                    best = Some(Candidate {
                        feature,
                        threshold,
                        position: pos,
                        gain,
                    });
                }
            }
        }
        best
    }
}
