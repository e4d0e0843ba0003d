//! Feature domain: the feature schema, crop encoding and the engineer that
//! applies both identically at training and serving time.

pub mod domain;
pub mod service;

pub use domain::{CropEncoder, FeatureField, FeatureMatrix, FeatureSchema, FeatureVector};
pub use service::FeatureEngineer;
