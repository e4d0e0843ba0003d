//! Prediction payloads returned to callers.

use serde::{Deserialize, Serialize};

use crate::training::domain::TargetKind;

/// One prediction. Serialized with exactly the keys `yield`, `price`,
/// `production`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "yield")]
    pub yield_: f64,
    pub price: f64,
    pub production: f64,
}

impl Prediction {
    pub fn get(&self, target: TargetKind) -> f64 {
        match target {
            TargetKind::Yield => self.yield_,
            TargetKind::Price => self.price,
            TargetKind::Production => self.production,
        }
    }

    pub fn is_finite(&self) -> bool {
        TargetKind::ALL.iter().all(|t| self.get(*t).is_finite())
    }
}

/// Row-aligned batch output: entry `i` of each vector belongs to input row `i`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchPrediction {
    #[serde(rename = "yield")]
    pub yield_: Vec<f64>,
    pub price: Vec<f64>,
    pub production: Vec<f64>,
}

impl BatchPrediction {
    pub fn len(&self) -> usize {
        self.yield_.len()
    }

    pub fn is_empty(&self) -> bool {
        self.yield_.is_empty()
    }

    pub fn push(&mut self, p: Prediction) {
        self.yield_.push(p.yield_);
        self.price.push(p.price);
        self.production.push(p.production);
    }

    pub fn row(&self, i: usize) -> Option<Prediction> {
        Some(Prediction {
            yield_: *self.yield_.get(i)?,
            price: *self.price.get(i)?,
            production: *self.production.get(i)?,
        })
    }
}

impl FromIterator<Prediction> for BatchPrediction {
    fn from_iter<I: IntoIterator<Item = Prediction>>(iter: I) -> Self {
        let mut batch = BatchPrediction::default();
        for p in iter {
            batch.push(p);
        }
        batch
    }
}
