//! Feature schema and categorical encoding shared by training and serving.
//!
//! [`FeatureSchema::canonical`] is the single definition of the feature
//! order. A fitted engineer stores its own copy and every transform walks that
//! copy, so a loaded artifact keeps the order it was trained with.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::common::error::{CropError, CropResult};
use crate::common::ids;
use crate::data::domain::{Covariate, Observation};

/// One column of the feature matrix.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FeatureField {
    Raw(Covariate),
    RainfallSquared,
    TemperatureHumidity,
    FertilizerIrrigation,
    CropEncoded,
}

impl FeatureField {
    pub fn name(self) -> &'static str {
        match self {
            FeatureField::Raw(covariate) => covariate.field_name(),
            FeatureField::RainfallSquared => "rainfall_squared",
            FeatureField::TemperatureHumidity => "temperature_humidity_interaction",
            FeatureField::FertilizerIrrigation => "fertilizer_irrigation_interaction",
            FeatureField::CropEncoded => "crop_encoded",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(covariate) = Covariate::from_field_name(name) {
            return Some(FeatureField::Raw(covariate));
        }
        match name {
            "rainfall_squared" => Some(FeatureField::RainfallSquared),
            "temperature_humidity_interaction" => Some(FeatureField::TemperatureHumidity),
            "fertilizer_irrigation_interaction" => Some(FeatureField::FertilizerIrrigation),
            "crop_encoded" => Some(FeatureField::CropEncoded),
            _ => None,
        }
    }

    /// Compute this column for one observation whose crop is already encoded.
    pub fn value(self, obs: &Observation, crop_code: usize) -> f64 {
        let c = &obs.covariates;
        match self {
            FeatureField::Raw(covariate) => c.get(covariate),
            FeatureField::RainfallSquared => c.rainfall_mm * c.rainfall_mm,
            FeatureField::TemperatureHumidity => c.temperature_c * c.humidity_percent,
            FeatureField::FertilizerIrrigation => c.fertilizer_use_kg_ha * c.irrigation_area_percent,
            FeatureField::CropEncoded => crop_code as f64,
        }
    }
}

/// Ordered list of feature columns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureSchema {
    fields: Vec<FeatureField>,
}

impl FeatureSchema {
    /// The order this build of the crate trains with.
    pub fn canonical() -> Self {
        let mut fields: Vec<FeatureField> = Covariate::ALL.into_iter().map(FeatureField::Raw).collect();
        fields.extend([
            FeatureField::RainfallSquared,
            FeatureField::TemperatureHumidity,
            FeatureField::FertilizerIrrigation,
            FeatureField::CropEncoded,
        ]);
        Self { fields }
    }

    pub fn from_names<S: AsRef<str>>(names: &[S]) -> CropResult<Self> {
        let fields = names
            .iter()
            .map(|n| {
                FeatureField::from_name(n.as_ref()).ok_or_else(|| {
                    CropError::Artifact(format!("unknown feature `{}`", n.as_ref()))
                })
            })
            .collect::<CropResult<Vec<_>>>()?;
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FeatureField] {
        &self.fields
    }

    pub fn names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fingerprint(&self) -> String {
        ids::fingerprint_names(&self.names())
    }

    /// Fail fast when a stored schema differs from the running code's order.
    pub fn ensure_matches(&self, expected: &FeatureSchema) -> CropResult<()> {
        if self == expected {
            Ok(())
        } else {
            Err(CropError::SchemaMismatch {
                expected: expected.names(),
                found: self.names(),
            })
        }
    }
}

impl TryFrom<Vec<String>> for FeatureSchema {
    type Error = CropError;

    fn try_from(names: Vec<String>) -> CropResult<Self> {
        Self::from_names(&names)
    }
}

impl From<FeatureSchema> for Vec<String> {
    fn from(schema: FeatureSchema) -> Self {
        schema.names()
    }
}

/// Bidirectional crop name ↔ code mapping; codes follow sorted name order.
///
/// Serialized as the ordered class list; the lookup index is rebuilt on load.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct CropEncoder {
    classes: Vec<String>,
    index: BTreeMap<String, usize>,
}

impl CropEncoder {
    /// Fit from any collection of names; duplicates collapse.
    pub fn fit<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classes: Vec<String> = names.into_iter().map(|s| s.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();
        Self::from_classes(classes)
    }

    fn from_classes(classes: Vec<String>) -> Self {
        let index = classes
            .iter()
            .enumerate()
            .map(|(code, name)| (name.clone(), code))
            .collect();
        Self { classes, index }
    }

    pub fn encode(&self, crop: &str) -> CropResult<usize> {
        self.index
            .get(crop)
            .copied()
            .ok_or_else(|| CropError::unknown_category(crop))
    }

    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl From<Vec<String>> for CropEncoder {
    fn from(classes: Vec<String>) -> Self {
        Self::from_classes(classes)
    }
}

impl From<CropEncoder> for Vec<String> {
    fn from(encoder: CropEncoder) -> Self {
        encoder.classes
    }
}

/// Row-major feature matrix with the column names it was built with.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureMatrix {
    pub fields: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

/// A single transformed record.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureVector {
    pub fields: Vec<String>,
    pub values: Vec<f64>,
}
