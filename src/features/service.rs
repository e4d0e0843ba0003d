//! Feature engineering: observations in, fixed-order numeric rows out.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::error::{CropError, CropResult};
use crate::data::domain::{Observation, TrainingExample};

use super::domain::{CropEncoder, FeatureMatrix, FeatureSchema, FeatureVector};

/// Owns the crop encoding table and the captured feature order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureEngineer {
    schema: FeatureSchema,
    encoder: CropEncoder,
}

impl FeatureEngineer {
    /// Fit a fresh encoder from the training crops and capture the canonical order.
    pub fn fit(examples: &[TrainingExample]) -> CropResult<Self> {
        if examples.is_empty() {
            return Err(CropError::insufficient("no training examples to fit features on"));
        }
        Ok(Self {
            schema: FeatureSchema::canonical(),
            encoder: CropEncoder::fit(examples.iter().map(|e| e.record.crop.as_str())),
        })
    }

    /// Rehydrate from persisted parts.
    pub fn from_parts(schema: FeatureSchema, encoder: CropEncoder) -> Self {
        Self { schema, encoder }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn encoder(&self) -> &CropEncoder {
        &self.encoder
    }

    pub fn field_names(&self) -> Vec<String> {
        self.schema.names()
    }

    /// Transform one observation into values following the captured order.
    pub fn transform_observation(&self, obs: &Observation) -> CropResult<Vec<f64>> {
        let code = self.encoder.encode(&obs.crop)?;
        Ok(self
            .schema
            .fields()
            .iter()
            .map(|field| field.value(obs, code))
            .collect())
    }

    /// Transform a loosely typed record (`crop` plus the nine covariates).
    pub fn transform_record(&self, record: &Value) -> CropResult<FeatureVector> {
        let obs = Observation::from_value(record)?;
        Ok(FeatureVector {
            fields: self.field_names(),
            values: self.transform_observation(&obs)?,
        })
    }

    /// Row-aligned batch transform; the first failing row aborts the batch.
    pub fn transform_batch(&self, records: &[Value]) -> CropResult<FeatureMatrix> {
        let rows = records
            .iter()
            .map(|r| Observation::from_value(r).and_then(|obs| self.transform_observation(&obs)))
            .collect::<CropResult<Vec<_>>>()?;
        Ok(FeatureMatrix {
            fields: self.field_names(),
            rows,
        })
    }

    /// Transform the training table.
    pub fn transform_examples(&self, examples: &[TrainingExample]) -> CropResult<FeatureMatrix> {
        let rows = examples
            .iter()
            .map(|e| self.transform_observation(&e.observation()))
            .collect::<CropResult<Vec<_>>>()?;
        Ok(FeatureMatrix {
            fields: self.field_names(),
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::domain::{Covariates, HistoricalRecord};
    use serde_json::json;

    fn example(crop: &str) -> TrainingExample {
        TrainingExample {
            record: HistoricalRecord {
                year: 2008,
                crop: crop.to_string(),
                area: 1.0,
                production: 1.0,
                yield_per_area: 1.0,
                farmer_count: 1,
            },
            covariates: Covariates::from_values([800.0, 27.0, 70.0, 6.5, 60.0, 20.0, 1.2, 15.0, 100.0]),
            price: 300.0,
        }
    }

    #[test]
    fn derived_terms_and_encoding() {
        let fe = FeatureEngineer::fit(&[example("Rice"), example("Millet")]).unwrap();
        let m = fe.transform_examples(&[example("Rice")]).unwrap();
        let row = &m.rows[0];
        assert_eq!(row.len(), 13);
        assert_eq!(row[9], 800.0 * 800.0);
        assert_eq!(row[10], 27.0 * 70.0);
        assert_eq!(row[11], 60.0 * 20.0);
        assert_eq!(row[12], 1.0);
    }

    #[test]
    fn record_order_matches_fitted_order() {
        let fe = FeatureEngineer::fit(&[example("Rice")]).unwrap();
        let v = fe
            .transform_record(&json!({
                "crop": "Rice", "rainfall_mm": 1, "temperature_c": 2, "humidity_percent": 3,
                "soil_ph": 4, "fertilizer_use_kg_ha": 5, "irrigation_area_percent": 6,
                "fuel_price_usd_liter": 7, "labor_cost_usd_day": 8, "market_demand_index": 9
            }))
            .unwrap();
        assert_eq!(v.fields, fe.field_names());
        assert_eq!(v.values[..9], [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(v.values[12], 0.0);
    }

    #[test]
    fn unseen_crop_fails_explicitly() {
        let fe = FeatureEngineer::fit(&[example("Rice")]).unwrap();
        let err = fe.transform_examples(&[example("Quinoa")]).unwrap_err();
        assert!(matches!(err, CropError::UnknownCategory { .. }));
    }

    #[test]
    fn batch_is_row_aligned() {
        let fe = FeatureEngineer::fit(&[example("Rice"), example("Maize")]).unwrap();
        let base = json!({
            "rainfall_mm": 1, "temperature_c": 2, "humidity_percent": 3,
            "soil_ph": 4, "fertilizer_use_kg_ha": 5, "irrigation_area_percent": 6,
            "fuel_price_usd_liter": 7, "labor_cost_usd_day": 8, "market_demand_index": 9
        });
        let mut rice = base.clone();
        rice["crop"] = json!("Rice");
        let mut maize = base;
        maize["crop"] = json!("Maize");
        let m = fe.transform_batch(&[rice, maize]).unwrap();
        assert_eq!(m.rows.len(), 2);
        assert_eq!(m.rows[0][12], 1.0);
        assert_eq!(m.rows[1][12], 0.0);
    }

    #[test]
    fn empty_table_cannot_fit() {
        assert!(matches!(
            FeatureEngineer::fit(&[]),
            Err(CropError::InsufficientData(_))
        ));
    }
}
