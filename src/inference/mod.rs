//! Inference domain: single and batch prediction plus scenario analysis.

pub mod domain;
pub mod scenario;
pub mod service;

pub use domain::{BatchPrediction, Prediction};
pub use scenario::{Outcome, Scenario, ScenarioRunner};
pub use service::PredictionService;
