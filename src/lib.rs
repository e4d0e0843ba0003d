//! Crop yield, price and production prediction from historical records.
pub mod api;
pub mod common;
pub mod data;
pub mod evaluation;
pub mod features;
pub mod inference;
pub mod pipeline;
pub mod training;

pub use common::error::{CropError, CropResult, ErrorCode};
pub use inference::domain::{BatchPrediction, Prediction};
pub use pipeline::CropPipeline;
pub use training::domain::{TargetKind, TrainConfig};
