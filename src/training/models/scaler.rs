//! Per-feature standardization fitted on the training partition only.

use serde::{Deserialize, Serialize};

use crate::common::error::{CropError, CropResult};

/// Zero-mean, unit-variance scaler. Columns with zero variance keep scale 1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(x: &[Vec<f64>]) -> CropResult<Self> {
        let first = x
            .first()
            .ok_or_else(|| CropError::insufficient("cannot fit a scaler on zero rows"))?;
        let width = first.len();
        if x.iter().any(|row| row.len() != width) {
            return Err(CropError::invalid("ragged feature matrix"));
        }

        let n = x.len() as f64;
        let mut mean = vec![0.0; width];
        for row in x {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut var = vec![0.0; width];
        for row in x {
            for ((acc, v), m) in var.iter_mut().zip(row).zip(&mean) {
                let d = v - m;
                *acc += d * d;
            }
        }
        let scale = var
            .into_iter()
            .map(|ss| {
                let sd = (ss / n).sqrt();
                if sd > f64::EPSILON * 10.0 {
                    sd
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn transform_row(&self, row: &[f64]) -> CropResult<Vec<f64>> {
        if row.len() != self.mean.len() {
            return Err(CropError::invalid(format!(
                "expected {} features, got {}",
                self.mean.len(),
                row.len()
            )));
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }

    pub fn transform(&self, x: &[Vec<f64>]) -> CropResult<Vec<Vec<f64>>> {
        x.iter().map(|row| self.transform_row(row)).collect()
    }
}
