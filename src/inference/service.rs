//! Serving: stored schema and encoder, then each target's scaler and regressor.

use std::time::Instant;

use serde_json::Value;
use tracing::debug;

use crate::common::error::{CropError, CropResult};
use crate::common::time;
use crate::data::domain::Observation;
use crate::features::service::FeatureEngineer;
use crate::training::domain::{TargetKind, TargetSlots};

use super::domain::{BatchPrediction, Prediction};

/// Borrowed view over a trained state. Only constructible when every target
/// slot is populated and an encoder exists.
#[derive(Clone, Copy, Debug)]
pub struct PredictionService<'a> {
    engineer: &'a FeatureEngineer,
    models: &'a TargetSlots,
}

impl<'a> PredictionService<'a> {
    pub fn new(engineer: Option<&'a FeatureEngineer>, models: &'a TargetSlots) -> CropResult<Self> {
        match engineer {
            Some(engineer) if models.is_complete() && !engineer.encoder().is_empty() => {
                Ok(Self { engineer, models })
            }
            _ => Err(CropError::NotTrained),
        }
    }

    pub fn engineer(&self) -> &'a FeatureEngineer {
        self.engineer
    }

    /// Predict from an already engineered feature row.
    pub fn predict_features(&self, row: &[f64]) -> CropResult<Prediction> {
        Ok(Prediction {
            yield_: self.models.require(TargetKind::Yield)?.predict(row)?,
            price: self.models.require(TargetKind::Price)?.predict(row)?,
            production: self.models.require(TargetKind::Production)?.predict(row)?,
        })
    }

    pub fn predict_observation(&self, obs: &Observation) -> CropResult<Prediction> {
        let row = self.engineer.transform_observation(obs)?;
        self.predict_features(&row)
    }

    pub fn predict(&self, input: &Value) -> CropResult<Prediction> {
        let started = Instant::now();
        let obs = Observation::from_value(input)?;
        let prediction = self.predict_observation(&obs)?;
        debug!(
            ev = "infer.predict",
            crop = obs.crop.as_str(),
            dur_ms = time::elapsed_ms(started)
        );
        Ok(prediction)
    }

    /// The first failing row aborts the whole batch.
    pub fn predict_batch(&self, inputs: &[Value]) -> CropResult<BatchPrediction> {
        let started = Instant::now();
        let matrix = self.engineer.transform_batch(inputs)?;
        let batch = matrix
            .rows
            .iter()
            .map(|row| self.predict_features(row))
            .collect::<CropResult<BatchPrediction>>()?;
        debug!(
            ev = "infer.batch",
            rows = batch.len(),
            dur_ms = time::elapsed_ms(started)
        );
        Ok(batch)
    }
}
