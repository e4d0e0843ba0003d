//! What-if analysis on top of a trained pipeline: named condition sets,
//! projected forward in time, rainfall sweeps and multi-year trends.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::common::error::{CropError, CropResult};
use crate::data::domain::{Covariate, Covariates, Observation};

use super::domain::Prediction;
use super::service::PredictionService;

/// Crops covered by the default scenario tables.
pub const SCENARIO_CROPS: [&str; 8] = [
    "Rice",
    "Millet",
    "Sorghum",
    "Maize",
    "Groundnuts",
    "Cotton",
    "Vegetables",
    "Fruits",
];

pub const RAINFALL_LEVELS: [f64; 6] = [400.0, 600.0, 800.0, 1000.0, 1200.0, 1400.0];

/// Linear yearly growth applied when projecting conditions `n` years ahead.
/// Humidity and soil pH are held fixed.
fn annual_growth(covariate: Covariate) -> f64 {
    match covariate {
        Covariate::Rainfall => 0.005,
        Covariate::Temperature => 0.01,
        Covariate::Humidity | Covariate::SoilPh => 0.0,
        Covariate::FertilizerUse | Covariate::IrrigationShare => 0.03,
        Covariate::FuelPrice | Covariate::LaborCost => 0.05,
        Covariate::MarketDemand => 0.02,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub conditions: Covariates,
}

impl Scenario {
    pub fn new(name: impl Into<String>, conditions: Covariates) -> Self {
        Self {
            name: name.into(),
            conditions,
        }
    }

    pub fn good() -> Self {
        Self::new(
            "good",
            Covariates::from_values([900.0, 28.0, 80.0, 6.8, 80.0, 30.0, 1.2, 15.0, 120.0]),
        )
    }

    pub fn average() -> Self {
        Self::new(
            "average",
            Covariates::from_values([800.0, 27.0, 70.0, 6.5, 60.0, 20.0, 1.3, 16.0, 100.0]),
        )
    }

    pub fn poor() -> Self {
        Self::new(
            "poor",
            Covariates::from_values([600.0, 32.0, 60.0, 5.5, 40.0, 10.0, 1.5, 18.0, 80.0]),
        )
    }

    pub fn defaults() -> Vec<Scenario> {
        vec![Self::good(), Self::average(), Self::poor()]
    }

    /// Conditions `years_ahead` years from now (negative looks back).
    pub fn projected(&self, years_ahead: i32) -> Covariates {
        project(&self.conditions, years_ahead)
    }
}

pub fn project(base: &Covariates, years_ahead: i32) -> Covariates {
    let mut out = *base;
    let dt = f64::from(years_ahead);
    for covariate in Covariate::ALL {
        out.set(covariate, base.get(covariate) * (1.0 + dt * annual_growth(covariate)));
    }
    out
}

/// Result of one table row. A crop the model cannot serve fails its own row
/// and leaves the others intact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Predicted(Prediction),
    Failed { code: u32, error: String },
}

impl Outcome {
    pub fn prediction(&self) -> Option<&Prediction> {
        match self {
            Outcome::Predicted(p) => Some(p),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }
}

impl From<CropResult<Prediction>> for Outcome {
    fn from(result: CropResult<Prediction>) -> Self {
        match result {
            Ok(p) => Outcome::Predicted(p),
            Err(err) => Outcome::from(&err),
        }
    }
}

impl From<&CropError> for Outcome {
    fn from(err: &CropError) -> Self {
        Outcome::Failed {
            code: err.code() as u32,
            error: err.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioForecast {
    pub scenario: String,
    pub year: i32,
    pub crop: String,
    pub outcome: Outcome,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RainfallPoint {
    pub rainfall_mm: f64,
    pub crop: String,
    pub outcome: Outcome,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub year: i32,
    pub prediction: Prediction,
}

/// Runs scenario queries against a trained pipeline. `current_year` anchors
/// the projection: conditions for `current_year` are used as given.
pub struct ScenarioRunner<'a> {
    service: PredictionService<'a>,
    current_year: i32,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(service: PredictionService<'a>, current_year: i32) -> Self {
        Self {
            service,
            current_year,
        }
    }

    fn predict(&self, crop: &str, conditions: &Covariates) -> CropResult<Prediction> {
        self.service
            .predict_observation(&Observation::new(crop, *conditions))
    }

    fn outcome(&self, crop: &str, conditions: &Covariates) -> Outcome {
        let result = self.predict(crop, conditions);
        if let Err(err) = &result {
            warn!(ev = "scenario.row_failed", crop, code = err.code() as u32, error = %err);
        }
        Outcome::from(result)
    }

    /// Every scenario × crop for `year`, scenario-major. Rows are always
    /// produced; failures are carried in each row's outcome.
    pub fn forecast(
        &self,
        year: i32,
        scenarios: &[Scenario],
        crops: &[&str],
    ) -> Vec<ScenarioForecast> {
        let mut out = Vec::with_capacity(scenarios.len() * crops.len());
        for scenario in scenarios {
            let conditions = scenario.projected(year - self.current_year);
            for crop in crops {
                out.push(ScenarioForecast {
                    scenario: scenario.name.clone(),
                    year,
                    crop: crop.to_string(),
                    outcome: self.outcome(crop, &conditions),
                });
            }
        }
        out
    }

    /// Vary rainfall alone over `levels`, everything else held at `base`.
    pub fn rainfall_sweep(
        &self,
        base: &Covariates,
        levels: &[f64],
        crops: &[&str],
    ) -> Vec<RainfallPoint> {
        let mut out = Vec::with_capacity(levels.len() * crops.len());
        for &rainfall_mm in levels {
            let mut conditions = *base;
            conditions.set(Covariate::Rainfall, rainfall_mm);
            for crop in crops {
                out.push(RainfallPoint {
                    rainfall_mm,
                    crop: crop.to_string(),
                    outcome: self.outcome(crop, &conditions),
                });
            }
        }
        out
    }

    /// One crop across `first..=last`, projecting `base` for every year.
    pub fn trends(
        &self,
        crop: &str,
        base: &Covariates,
        first: i32,
        last: i32,
    ) -> CropResult<Vec<TrendPoint>> {
        (first..=last)
            .map(|year| {
                let conditions = project(base, year - self.current_year);
                Ok(TrendPoint {
                    year,
                    prediction: self.predict(crop, &conditions)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ErrorCode;

    #[test]
    fn projection_follows_growth_rates() {
        let base = Scenario::average().conditions;
        let p = project(&base, 10);
        assert!((p.rainfall_mm - 800.0 * 1.05).abs() < 1e-9);
        assert!((p.temperature_c - 27.0 * 1.1).abs() < 1e-9);
        assert_eq!(p.humidity_percent, 70.0);
        assert_eq!(p.soil_ph, 6.5);
        assert!((p.fertilizer_use_kg_ha - 60.0 * 1.3).abs() < 1e-9);
        assert!((p.labor_cost_usd_day - 16.0 * 1.5).abs() < 1e-9);
        assert!((p.market_demand_index - 120.0).abs() < 1e-9);
    }

    #[test]
    fn zero_offset_is_identity() {
        let s = Scenario::poor();
        assert_eq!(s.projected(0), s.conditions);
    }

    #[test]
    fn failed_outcome_keeps_the_error_code() {
        let result: CropResult<Prediction> = Err(CropError::unknown_category("Sorghum"));
        let outcome = Outcome::from(result);
        assert!(outcome.is_failed());
        assert!(outcome.prediction().is_none());
        assert_eq!(
            outcome,
            Outcome::Failed {
                code: ErrorCode::UnknownCategory as u32,
                error: "unknown crop category: Sorghum".into(),
            }
        );
    }

    #[test]
    fn defaults_are_ordered_good_to_poor() {
        let names: Vec<String> = Scenario::defaults().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["good", "average", "poor"]);
    }
}
