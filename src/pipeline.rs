//! The public facade: train on historical records, predict, persist.

use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::common::error::{CropError, CropResult};
use crate::data::domain::{HistoricalRecord, Observation, RecordSource, TrainingExample};
use crate::evaluation::domain::FeatureImportance;
use crate::evaluation::service as eval;
use crate::features::domain::FeatureVector;
use crate::features::service::FeatureEngineer;
use crate::inference::domain::{BatchPrediction, Prediction};
use crate::inference::scenario::ScenarioRunner;
use crate::inference::service::PredictionService;
use crate::training::domain::{TargetKind, TargetModel, TargetSlots, TrainConfig, TrainedArtifact};
use crate::training::repo_fs;
use crate::training::service::{self as training, Trained};

/// Crop yield, price and production predictor.
///
/// `fit` replaces the whole trained state or leaves the previous one in
/// place when it fails.
#[derive(Clone, Debug, Default)]
pub struct CropPipeline {
    cfg: TrainConfig,
    engineer: Option<FeatureEngineer>,
    models: TargetSlots,
    trained_at_ms: u64,
}

impl CropPipeline {
    pub fn new(cfg: TrainConfig) -> Self {
        Self {
            cfg,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.cfg
    }

    pub fn is_trained(&self) -> bool {
        self.engineer.is_some() && self.models.is_complete()
    }

    fn commit(&mut self, trained: Trained) {
        self.engineer = Some(trained.engineer);
        self.models = trained.models;
        self.trained_at_ms = trained.trained_at_ms;
    }

    pub fn fit(&mut self, records: &[HistoricalRecord]) -> CropResult<()> {
        let trained = training::train_records(records, &self.cfg)?;
        self.commit(trained);
        Ok(())
    }

    /// Train on an already assembled table (covariates and prices attached).
    pub fn fit_examples(&mut self, examples: &[TrainingExample]) -> CropResult<()> {
        let trained = training::train_examples(examples, &self.cfg)?;
        self.commit(trained);
        Ok(())
    }

    pub fn fit_from_source<S: RecordSource + ?Sized>(&mut self, source: &S) -> CropResult<()> {
        let trained = training::train_from_source(source, &self.cfg)?;
        self.commit(trained);
        Ok(())
    }

    pub fn service(&self) -> CropResult<PredictionService<'_>> {
        PredictionService::new(self.engineer.as_ref(), &self.models)
    }

    pub fn predict(&self, input: &Value) -> CropResult<Prediction> {
        self.service()?.predict(input)
    }

    pub fn predict_observation(&self, obs: &Observation) -> CropResult<Prediction> {
        self.service()?.predict_observation(obs)
    }

    pub fn predict_batch(&self, inputs: &[Value]) -> CropResult<BatchPrediction> {
        self.service()?.predict_batch(inputs)
    }

    /// Scenario queries anchored at `current_year`.
    pub fn scenarios(&self, current_year: i32) -> CropResult<ScenarioRunner<'_>> {
        Ok(ScenarioRunner::new(self.service()?, current_year))
    }

    pub fn transform_record(&self, record: &Value) -> CropResult<FeatureVector> {
        self.engineer
            .as_ref()
            .ok_or(CropError::NotTrained)?
            .transform_record(record)
    }

    /// Feature order captured at fit time.
    pub fn field_names(&self) -> CropResult<Vec<String>> {
        Ok(self.engineer.as_ref().ok_or(CropError::NotTrained)?.field_names())
    }

    pub fn target_model(&self, target: TargetKind) -> CropResult<&TargetModel> {
        self.models.require(target)
    }

    pub fn feature_importance(&self, target: TargetKind) -> CropResult<FeatureImportance> {
        let names = self.field_names()?;
        let model = self.models.require(target)?;
        Ok(eval::importance(target, &model.regressor, &names))
    }

    pub fn to_artifact(&self) -> CropResult<TrainedArtifact> {
        let engineer = self.engineer.clone().ok_or(CropError::NotTrained)?;
        if !self.models.is_complete() {
            return Err(CropError::NotTrained);
        }
        Ok(training::to_artifact(
            &Trained {
                engineer,
                models: self.models.clone(),
                trained_at_ms: self.trained_at_ms,
            },
            &self.cfg,
        ))
    }

    pub fn from_artifact(artifact: TrainedArtifact) -> CropResult<Self> {
        let (trained, cfg) = training::from_artifact(artifact)?;
        let mut pipeline = Self::new(cfg);
        pipeline.commit(trained);
        Ok(pipeline)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> CropResult<()> {
        repo_fs::save_artifact(path, &self.to_artifact()?)
    }

    pub fn load(path: impl AsRef<Path>) -> CropResult<Self> {
        let pipeline = Self::from_artifact(repo_fs::load_artifact(path)?)?;
        info!(ev = "pipeline.loaded", trained_at_ms = pipeline.trained_at_ms);
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn untrained_pipeline_refuses_everything() {
        let p = CropPipeline::default();
        assert!(!p.is_trained());
        let input = json!({"crop": "Rice"});
        assert!(matches!(p.predict(&input), Err(CropError::NotTrained)));
        assert!(matches!(p.predict_batch(&[input]), Err(CropError::NotTrained)));
        assert!(matches!(p.field_names(), Err(CropError::NotTrained)));
        assert!(matches!(p.to_artifact(), Err(CropError::NotTrained)));
        assert!(matches!(
            p.feature_importance(TargetKind::Yield),
            Err(CropError::NotTrained)
        ));
    }

    #[test]
    fn failed_fit_keeps_untrained_state() {
        let mut p = CropPipeline::default();
        assert!(matches!(p.fit(&[]), Err(CropError::InsufficientData(_))));
        assert!(!p.is_trained());
    }
}
