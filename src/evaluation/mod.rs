//! Model scoring: regression metrics, cross-validation, feature importance.

pub mod domain;
pub mod service;

pub use domain::{CvScore, FeatureImportance, FeatureWeight, RegressionMetrics};
