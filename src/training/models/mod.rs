//! Candidate regressor families.
//!
//! The set is closed: [`Regressor`] is an enum over the four families so a
//! trained model can be persisted and reloaded without any registry.

pub mod boosting;
pub mod forest;
pub mod linear;
pub mod scaler;
pub mod tree;

use serde::{Deserialize, Serialize};

use crate::common::error::CropResult;

use super::domain::TrainConfig;

pub use boosting::{BoostingParams, GradientBoosting};
pub use forest::{ForestParams, RandomForest};
pub use linear::LinearModel;
pub use scaler::StandardScaler;
pub use tree::{RegressionTree, TreeParams};

/// Common capability of every regressor family.
pub trait Regress {
    /// Fit from scratch, discarding any previous state.
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> CropResult<()>;

    fn predict_row(&self, row: &[f64]) -> f64;

    fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        x.iter().map(|row| self.predict_row(row)).collect()
    }

    /// One non-negative weight per feature column.
    fn feature_importance(&self) -> Vec<f64>;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressorKind {
    RandomForest,
    GradientBoosting,
    Ridge,
    Linear,
}

impl RegressorKind {
    /// Candidate order; the first family wins a tie on mean CV score.
    pub const ALL: [RegressorKind; 4] = [
        RegressorKind::RandomForest,
        RegressorKind::GradientBoosting,
        RegressorKind::Ridge,
        RegressorKind::Linear,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RegressorKind::RandomForest => "random_forest",
            RegressorKind::GradientBoosting => "gradient_boosting",
            RegressorKind::Ridge => "ridge",
            RegressorKind::Linear => "linear",
        }
    }

    /// Fresh, unfitted regressor configured from `cfg`.
    pub fn build(self, cfg: &TrainConfig) -> Regressor {
        match self {
            RegressorKind::RandomForest => {
                Regressor::RandomForest(RandomForest::new(cfg.forest.clone(), cfg.seeds.models))
            }
            RegressorKind::GradientBoosting => Regressor::GradientBoosting(GradientBoosting::new(
                cfg.boosting.clone(),
                cfg.seeds.models,
            )),
            RegressorKind::Ridge => Regressor::Ridge(LinearModel::ridge(cfg.ridge_alpha)),
            RegressorKind::Linear => Regressor::Linear(LinearModel::ordinary()),
        }
    }
}

impl std::fmt::Display for RegressorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Regressor {
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
    Ridge(LinearModel),
    Linear(LinearModel),
}

impl Regressor {
    pub fn kind(&self) -> RegressorKind {
        match self {
            Regressor::RandomForest(_) => RegressorKind::RandomForest,
            Regressor::GradientBoosting(_) => RegressorKind::GradientBoosting,
            Regressor::Ridge(_) => RegressorKind::Ridge,
            Regressor::Linear(_) => RegressorKind::Linear,
        }
    }

    fn inner(&self) -> &dyn Regress {
        match self {
            Regressor::RandomForest(m) => m,
            Regressor::GradientBoosting(m) => m,
            Regressor::Ridge(m) | Regressor::Linear(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Regress {
        match self {
            Regressor::RandomForest(m) => m,
            Regressor::GradientBoosting(m) => m,
            Regressor::Ridge(m) | Regressor::Linear(m) => m,
        }
    }
}

impl Regress for Regressor {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> CropResult<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        self.inner().predict_row(row)
    }

    fn feature_importance(&self) -> Vec<f64> {
        self.inner().feature_importance()
    }
}
