//! Domain types for target models, training configuration and the persisted
//! artifact.

use serde::{Deserialize, Serialize};

use crate::common::error::{CropError, CropResult};
use crate::data::covariates::REFERENCE_YEAR;
use crate::data::domain::TrainingExample;
use crate::data::price::MIN_PRICE;
use crate::evaluation::domain::{CvScore, RegressionMetrics};
use crate::features::domain::{CropEncoder, FeatureSchema};

use super::models::{BoostingParams, ForestParams, Regress, Regressor, RegressorKind, StandardScaler};

/// The three predicted quantities.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Yield,
    Price,
    Production,
}

impl TargetKind {
    pub const ALL: [TargetKind; 3] = [TargetKind::Yield, TargetKind::Price, TargetKind::Production];

    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Yield => "yield",
            TargetKind::Price => "price",
            TargetKind::Production => "production",
        }
    }

    /// Lowest value a prediction for this target may take.
    pub fn floor(self) -> f64 {
        match self {
            TargetKind::Price => MIN_PRICE,
            TargetKind::Yield | TargetKind::Production => 0.0,
        }
    }

    pub fn value_of(self, example: &TrainingExample) -> f64 {
        match self {
            TargetKind::Yield => example.record.yield_per_area,
            TargetKind::Price => example.price,
            TargetKind::Production => example.record.production,
        }
    }

    pub fn column(self, examples: &[TrainingExample]) -> Vec<f64> {
        examples.iter().map(|e| self.value_of(e)).collect()
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named random sources; each one seeds its own generator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Seeds {
    pub covariates: u64,
    pub price: u64,
    pub split: u64,
    pub models: u64,
}

impl Default for Seeds {
    fn default() -> Self {
        Self {
            covariates: 42,
            price: 4242,
            split: 42,
            models: 42,
        }
    }
}

/// Training hyper-parameters, parsed from a JSON document. Every key is optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub test_fraction: f64,
    pub cv_folds: usize,
    pub seeds: Seeds,
    pub forest: ForestParams,
    pub boosting: BoostingParams,
    pub ridge_alpha: f64,
    pub first_year: i32,
    pub last_year: i32,
    pub reference_year: i32,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            cv_folds: 5,
            seeds: Seeds::default(),
            forest: ForestParams::default(),
            boosting: BoostingParams::default(),
            ridge_alpha: 1.0,
            first_year: 2001,
            last_year: 2021,
            reference_year: REFERENCE_YEAR,
        }
    }
}

impl TrainConfig {
    /// Parse and validate. Blank input yields the defaults.
    pub fn parse(raw: &str) -> CropResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Self = serde_json::from_str(raw)
            .map_err(|e| CropError::InvalidConfig(format!("train config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> CropResult<()> {
        let bad = |msg: &str| Err(CropError::InvalidConfig(msg.to_string()));
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return bad("test_fraction must lie in (0, 1)");
        }
        if self.cv_folds < 2 {
            return bad("cv_folds must be at least 2");
        }
        if !self.ridge_alpha.is_finite() || self.ridge_alpha < 0.0 {
            return bad("ridge_alpha must be finite and non-negative");
        }
        if self.first_year > self.last_year {
            return bad("first_year is after last_year");
        }
        if self.forest.n_estimators == 0 || self.boosting.n_estimators == 0 {
            return bad("ensembles need at least one estimator");
        }
        if self.boosting.learning_rate.is_nan() || self.boosting.learning_rate <= 0.0 {
            return bad("boosting.learning_rate must be positive");
        }
        let subsample = self.boosting.subsample;
        if subsample.is_nan() || subsample <= 0.0 || subsample > 1.0 {
            return bad("boosting.subsample must lie in (0, 1]");
        }
        Ok(())
    }
}

/// Selected model for one target, with its training-partition scaler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetModel {
    pub target: TargetKind,
    pub scaler: StandardScaler,
    pub regressor: Regressor,
    pub test: RegressionMetrics,
    /// Every candidate's cross-validation outcome, in candidate order.
    pub candidates: Vec<CvScore>,
    pub n_train: usize,
    pub n_test: usize,
}

impl TargetModel {
    pub fn family(&self) -> RegressorKind {
        self.regressor.kind()
    }

    /// Raw regressor output for one unscaled feature row.
    pub fn predict_raw(&self, features: &[f64]) -> CropResult<f64> {
        let scaled = self.scaler.transform_row(features)?;
        Ok(self.regressor.predict_row(&scaled))
    }

    /// Prediction bounded below by the target's floor.
    pub fn predict(&self, features: &[f64]) -> CropResult<f64> {
        Ok(self.predict_raw(features)?.max(self.target.floor()))
    }
}

/// Exactly one optional slot per target.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetSlots {
    #[serde(rename = "yield")]
    pub yield_: Option<TargetModel>,
    pub price: Option<TargetModel>,
    pub production: Option<TargetModel>,
}

impl TargetSlots {
    pub fn get(&self, target: TargetKind) -> Option<&TargetModel> {
        match target {
            TargetKind::Yield => self.yield_.as_ref(),
            TargetKind::Price => self.price.as_ref(),
            TargetKind::Production => self.production.as_ref(),
        }
    }

    pub fn set(&mut self, model: TargetModel) {
        let slot = match model.target {
            TargetKind::Yield => &mut self.yield_,
            TargetKind::Price => &mut self.price,
            TargetKind::Production => &mut self.production,
        };
        *slot = Some(model);
    }

    pub fn is_complete(&self) -> bool {
        TargetKind::ALL.iter().all(|t| self.get(*t).is_some())
    }

    /// The populated model for `target`, or `NotTrained`.
    pub fn require(&self, target: TargetKind) -> CropResult<&TargetModel> {
        self.get(target).ok_or(CropError::NotTrained)
    }
}

pub const ARTIFACT_FORMAT: &str = "cropcast.pipeline";
pub const ARTIFACT_VERSION: u32 = 1;

/// Everything needed to serve predictions, written and read as one document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainedArtifact {
    pub format: String,
    pub version: u32,
    pub trained_at_ms: u64,
    pub schema_fingerprint: String,
    pub features: FeatureSchema,
    pub encoder: CropEncoder,
    pub models: TargetSlots,
    pub trained: bool,
    pub config: TrainConfig,
}

impl TrainedArtifact {
    /// Reject anything that is not a complete artifact for this build's schema.
    pub fn validate(&self) -> CropResult<()> {
        if self.format != ARTIFACT_FORMAT {
            return Err(CropError::Artifact(format!("unexpected format `{}`", self.format)));
        }
        if self.version != ARTIFACT_VERSION {
            return Err(CropError::Artifact(format!("unsupported version {}", self.version)));
        }
        if !self.trained || !self.models.is_complete() || self.encoder.is_empty() {
            return Err(CropError::Artifact("artifact is only partially populated".into()));
        }
        self.features.ensure_matches(&FeatureSchema::canonical())?;
        if self.schema_fingerprint != self.features.fingerprint() {
            return Err(CropError::Artifact("schema fingerprint does not match fields".into()));
        }
        for target in TargetKind::ALL {
            let model = self.models.require(target)?;
            if model.target != target || model.scaler.n_features() != self.features.len() {
                return Err(CropError::Artifact(format!("model in `{target}` slot is inconsistent")));
            }
        }
        Ok(())
    }
}

/// Persistence contract for trained artifacts.
pub trait ArtifactRepo {
    fn put_artifact(&self, artifact: &TrainedArtifact) -> CropResult<()>;
    fn get_artifact(&self) -> CropResult<TrainedArtifact>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_config_is_default() {
        assert_eq!(TrainConfig::parse("  ").unwrap(), TrainConfig::default());
        assert_eq!(TrainConfig::parse("{}").unwrap(), TrainConfig::default());
    }

    #[test]
    fn partial_config_overrides_only_given_keys() {
        let cfg =
            TrainConfig::parse(r#"{"cv_folds": 3, "seeds": {"split": 7}, "forest": {"n_estimators": 20}}"#)
                .unwrap();
        assert_eq!(cfg.cv_folds, 3);
        assert_eq!(cfg.seeds.split, 7);
        assert_eq!(cfg.seeds.models, Seeds::default().models);
        assert_eq!(cfg.forest.n_estimators, 20);
        assert_eq!(cfg.forest.tree.min_samples_leaf, 1);
        assert_eq!(cfg.ridge_alpha, 1.0);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        for raw in [
            r#"{"test_fraction": 1.5}"#,
            r#"{"cv_folds": 1}"#,
            r#"{"ridge_alpha": -1}"#,
            r#"{"first_year": 2020, "last_year": 2010}"#,
            r#"{"boosting": {"learning_rate": 0}}"#,
            r#"{"boosting": {"subsample": 1.5}}"#,
            "not json",
        ] {
            assert!(
                matches!(TrainConfig::parse(raw), Err(CropError::InvalidConfig(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn floors_follow_target() {
        assert_eq!(TargetKind::Price.floor(), MIN_PRICE);
        assert_eq!(TargetKind::Yield.floor(), 0.0);
        assert_eq!(serde_json::to_string(&TargetKind::Production).unwrap(), "\"production\"");
    }

    #[test]
    fn empty_slots_are_incomplete() {
        let slots = TargetSlots::default();
        assert!(!slots.is_complete());
        assert!(matches!(slots.require(TargetKind::Price), Err(CropError::NotTrained)));
    }
}
