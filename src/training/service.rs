//! Service layer orchestrating example assembly and per-target training.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, info_span};

use crate::common::error::{CropError, CropResult};
use crate::common::time;
use crate::data::covariates::CovariateSynthesizer;
use crate::data::domain::{HistoricalRecord, RecordSource, TrainingExample};
use crate::data::price::PriceSynthesizer;
use crate::data::service as data_service;
use crate::features::service::FeatureEngineer;

use super::domain::{
    TargetKind, TargetSlots, TrainConfig, TrainedArtifact, ARTIFACT_FORMAT, ARTIFACT_VERSION,
};
use super::selection::ModelSelector;

/// Result of one successful training run.
#[derive(Clone, Debug)]
pub struct Trained {
    pub engineer: FeatureEngineer,
    pub models: TargetSlots,
    pub trained_at_ms: u64,
}

/// Attach covariates and prices, each drawn from its own seeded source.
pub fn build_examples(records: &[HistoricalRecord], cfg: &TrainConfig) -> Vec<TrainingExample> {
    let synthesizer = CovariateSynthesizer::new(cfg.reference_year);
    let mut covariate_rng = StdRng::seed_from_u64(cfg.seeds.covariates);
    let mut price_rng = StdRng::seed_from_u64(cfg.seeds.price);
    data_service::assemble_with_prices(
        records,
        &synthesizer,
        &mut covariate_rng,
        &PriceSynthesizer::new(),
        &mut price_rng,
    )
}

/// Fit a fresh encoder and one selected model per target. Nothing is
/// returned unless all three targets succeed.
pub fn train_examples(examples: &[TrainingExample], cfg: &TrainConfig) -> CropResult<Trained> {
    let started = Instant::now();
    let span = info_span!("train", rows = examples.len());
    let _guard = span.enter();

    if examples.is_empty() {
        return Err(CropError::insufficient("no historical records to train on"));
    }
    cfg.validate()?;

    let engineer = FeatureEngineer::fit(examples)?;
    let matrix = engineer.transform_examples(examples)?;
    let selector = ModelSelector::new(cfg);

    let mut models = TargetSlots::default();
    for target in TargetKind::ALL {
        let y = target.column(examples);
        models.set(selector.fit(target, &matrix.rows, &y)?);
    }

    info!(
        ev = "train.done",
        rows = examples.len(),
        crops = engineer.encoder().len(),
        dur_ms = time::elapsed_ms(started)
    );
    Ok(Trained {
        engineer,
        models,
        trained_at_ms: u64::try_from(time::now_ms()).unwrap_or(u64::MAX),
    })
}

pub fn train_records(records: &[HistoricalRecord], cfg: &TrainConfig) -> CropResult<Trained> {
    train_examples(&build_examples(records, cfg), cfg)
}

/// Load the configured year range from `source`, then train.
pub fn train_from_source<S>(source: &S, cfg: &TrainConfig) -> CropResult<Trained>
where
    S: RecordSource + ?Sized,
{
    let records = source.load_years(cfg.first_year, cfg.last_year)?;
    info!(
        ev = "train.records",
        rows = records.len(),
        first_year = cfg.first_year,
        last_year = cfg.last_year
    );
    train_records(&records, cfg)
}

/// Package a training result for persistence.
pub fn to_artifact(trained: &Trained, cfg: &TrainConfig) -> TrainedArtifact {
    let features = trained.engineer.schema().clone();
    TrainedArtifact {
        format: ARTIFACT_FORMAT.to_string(),
        version: ARTIFACT_VERSION,
        trained_at_ms: trained.trained_at_ms,
        schema_fingerprint: features.fingerprint(),
        features,
        encoder: trained.engineer.encoder().clone(),
        models: trained.models.clone(),
        trained: trained.models.is_complete(),
        config: cfg.clone(),
    }
}

/// Rebuild a training result from a validated artifact.
pub fn from_artifact(artifact: TrainedArtifact) -> CropResult<(Trained, TrainConfig)> {
    artifact.validate()?;
    let engineer = FeatureEngineer::from_parts(artifact.features, artifact.encoder);
    Ok((
        Trained {
            engineer,
            models: artifact.models,
            trained_at_ms: artifact.trained_at_ms,
        },
        artifact.config,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<HistoricalRecord> {
        (2001..=2012)
            .flat_map(|year| {
                ["Rice", "Millet"].into_iter().map(move |crop| {
                    let t = f64::from(year - 2000);
                    let area = 4000.0 + 150.0 * t;
                    let yield_per_area = if crop == "Rice" { 2.0 + 0.05 * t } else { 0.9 + 0.03 * t };
                    HistoricalRecord {
                        year,
                        crop: crop.to_string(),
                        area,
                        production: area * yield_per_area,
                        yield_per_area,
                        farmer_count: 100,
                    }
                })
            })
            .collect()
    }

    fn fast_cfg() -> TrainConfig {
        let mut cfg = TrainConfig::default();
        cfg.forest.n_estimators = 8;
        cfg.boosting.n_estimators = 15;
        cfg
    }

    #[test]
    fn examples_are_seeded() {
        let cfg = fast_cfg();
        let a = build_examples(&records(), &cfg);
        let b = build_examples(&records(), &cfg);
        assert_eq!(a, b);
        assert!(a.iter().all(|e| e.price >= crate::data::price::MIN_PRICE));
    }

    #[test]
    fn trains_every_target() {
        let cfg = fast_cfg();
        let trained = train_records(&records(), &cfg).unwrap();
        assert!(trained.models.is_complete());
        assert_eq!(trained.engineer.encoder().classes(), ["Millet", "Rice"]);
        let artifact = to_artifact(&trained, &cfg);
        assert!(artifact.trained);
        artifact.validate().unwrap();
        let (back, back_cfg) = from_artifact(artifact).unwrap();
        assert_eq!(back.models, trained.models);
        assert_eq!(back_cfg, cfg);
    }

    #[test]
    fn empty_input_is_insufficient() {
        assert!(matches!(
            train_records(&[], &fast_cfg()),
            Err(CropError::InsufficientData(_))
        ));
    }

    #[test]
    fn source_respects_year_range() {
        let mut cfg = fast_cfg();
        cfg.first_year = 2003;
        cfg.last_year = 2010;
        let recs = records();
        let trained = train_from_source(recs.as_slice(), &cfg).unwrap();
        let slot = trained.models.require(TargetKind::Yield).unwrap();
        assert_eq!(slot.n_train + slot.n_test, 16);
    }
}
