//! Data domain: historical records, covariate and price synthesis, and the
//! assembly of training examples.

pub mod covariates;
pub mod domain;
pub mod price;
pub mod repo_fs;
pub mod service;

pub use covariates::CovariateSynthesizer;
pub use domain::{Covariate, Covariates, HistoricalRecord, Observation, RecordSource, TrainingExample};
pub use price::{PriceSynthesizer, MIN_PRICE};
