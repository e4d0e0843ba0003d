//! Core record definitions: historical production rows, synthesized
//! covariates and the training examples built from both.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::common::error::{CropError, CropResult};

/// One historical production row for a (year, crop) pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub year: i32,
    pub crop: String,
    pub area: f64,
    pub production: f64,
    pub yield_per_area: f64,
    pub farmer_count: u64,
}

/// Source of historical records, keyed by year.
pub trait RecordSource {
    /// All records for years in `first..=last`, ordered by year then source order.
    fn load_years(&self, first: i32, last: i32) -> CropResult<Vec<HistoricalRecord>>;
}

impl RecordSource for [HistoricalRecord] {
    fn load_years(&self, first: i32, last: i32) -> CropResult<Vec<HistoricalRecord>> {
        let mut out: Vec<HistoricalRecord> = self
            .iter()
            .filter(|r| (first..=last).contains(&r.year))
            .cloned()
            .collect();
        out.sort_by_key(|r| r.year);
        Ok(out)
    }
}

/// The nine environmental/economic inputs, in canonical order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Covariate {
    Rainfall,
    Temperature,
    Humidity,
    SoilPh,
    FertilizerUse,
    IrrigationShare,
    FuelPrice,
    LaborCost,
    MarketDemand,
}

impl Covariate {
    pub const ALL: [Covariate; 9] = [
        Covariate::Rainfall,
        Covariate::Temperature,
        Covariate::Humidity,
        Covariate::SoilPh,
        Covariate::FertilizerUse,
        Covariate::IrrigationShare,
        Covariate::FuelPrice,
        Covariate::LaborCost,
        Covariate::MarketDemand,
    ];

    /// Wire/field name used by prediction inputs and the feature schema.
    pub fn field_name(self) -> &'static str {
        match self {
            Covariate::Rainfall => "rainfall_mm",
            Covariate::Temperature => "temperature_c",
            Covariate::Humidity => "humidity_percent",
            Covariate::SoilPh => "soil_ph",
            Covariate::FertilizerUse => "fertilizer_use_kg_ha",
            Covariate::IrrigationShare => "irrigation_area_percent",
            Covariate::FuelPrice => "fuel_price_usd_liter",
            Covariate::LaborCost => "labor_cost_usd_day",
            Covariate::MarketDemand => "market_demand_index",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.field_name() == name)
    }
}

/// A full set of covariate values.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Covariates {
    pub rainfall_mm: f64,
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub soil_ph: f64,
    pub fertilizer_use_kg_ha: f64,
    pub irrigation_area_percent: f64,
    pub fuel_price_usd_liter: f64,
    pub labor_cost_usd_day: f64,
    pub market_demand_index: f64,
}

impl Covariates {
    pub fn get(&self, covariate: Covariate) -> f64 {
        match covariate {
            Covariate::Rainfall => self.rainfall_mm,
            Covariate::Temperature => self.temperature_c,
            Covariate::Humidity => self.humidity_percent,
            Covariate::SoilPh => self.soil_ph,
            Covariate::FertilizerUse => self.fertilizer_use_kg_ha,
            Covariate::IrrigationShare => self.irrigation_area_percent,
            Covariate::FuelPrice => self.fuel_price_usd_liter,
            Covariate::LaborCost => self.labor_cost_usd_day,
            Covariate::MarketDemand => self.market_demand_index,
        }
    }

    pub fn set(&mut self, covariate: Covariate, value: f64) {
        let slot = match covariate {
            Covariate::Rainfall => &mut self.rainfall_mm,
            Covariate::Temperature => &mut self.temperature_c,
            Covariate::Humidity => &mut self.humidity_percent,
            Covariate::SoilPh => &mut self.soil_ph,
            Covariate::FertilizerUse => &mut self.fertilizer_use_kg_ha,
            Covariate::IrrigationShare => &mut self.irrigation_area_percent,
            Covariate::FuelPrice => &mut self.fuel_price_usd_liter,
            Covariate::LaborCost => &mut self.labor_cost_usd_day,
            Covariate::MarketDemand => &mut self.market_demand_index,
        };
        *slot = value;
    }

    /// Build from values given in [`Covariate::ALL`] order.
    pub fn from_values(values: [f64; 9]) -> Self {
        let mut out = Self::from_values_unset();
        for (covariate, value) in Covariate::ALL.into_iter().zip(values) {
            out.set(covariate, value);
        }
        out
    }

    fn from_values_unset() -> Self {
        Self {
            rainfall_mm: 0.0,
            temperature_c: 0.0,
            humidity_percent: 0.0,
            soil_ph: 0.0,
            fertilizer_use_kg_ha: 0.0,
            irrigation_area_percent: 0.0,
            fuel_price_usd_liter: 0.0,
            labor_cost_usd_day: 0.0,
            market_demand_index: 0.0,
        }
    }
}

/// A crop under a set of conditions: the unit the feature engineer consumes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub crop: String,
    pub covariates: Covariates,
}

impl Observation {
    pub fn new(crop: impl Into<String>, covariates: Covariates) -> Self {
        Self {
            crop: crop.into(),
            covariates,
        }
    }

    /// Extract an observation from a loosely typed record.
    ///
    /// `crop` and all nine covariate keys are required; extra keys are ignored.
    pub fn from_fields(fields: &Map<String, Value>) -> CropResult<Self> {
        let crop = match fields.get("crop") {
            None | Some(Value::Null) => return Err(CropError::missing_field("crop")),
            Some(Value::String(name)) => name.clone(),
            Some(other) => {
                return Err(CropError::invalid(format!(
                    "field `crop` must be a string, got {other}"
                )))
            }
        };

        let mut covariates = Covariates::from_values_unset();
        for covariate in Covariate::ALL {
            let name = covariate.field_name();
            let value = match fields.get(name) {
                None | Some(Value::Null) => return Err(CropError::missing_field(name)),
                Some(value) => value.as_f64().ok_or_else(|| {
                    CropError::invalid(format!("field `{name}` must be numeric, got {value}"))
                })?,
            };
            covariates.set(covariate, value);
        }

        Ok(Self { crop, covariates })
    }

    /// Extract from a JSON value that must be an object.
    pub fn from_value(value: &Value) -> CropResult<Self> {
        match value {
            Value::Object(fields) => Self::from_fields(fields),
            other => Err(CropError::invalid(format!(
                "prediction input must be an object, got {other}"
            ))),
        }
    }
}

/// A historical record enriched with synthesized covariates and a price target.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingExample {
    pub record: HistoricalRecord,
    pub covariates: Covariates,
    pub price: f64,
}

impl TrainingExample {
    pub fn observation(&self) -> Observation {
        Observation::new(self.record.crop.clone(), self.covariates)
    }
}
