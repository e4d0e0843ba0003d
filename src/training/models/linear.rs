//! Least-squares linear regression, optionally L2-regularized (ridge).
//!
//! The intercept is never penalized: features and target are centred before
//! solving `(XᵀX + αI) w = Xᵀy`. Collinear or constant columns get a zero
//! coefficient instead of blowing up the solve.

use serde::{Deserialize, Serialize};

use crate::common::error::{CropError, CropResult};

use super::Regress;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    alpha: f64,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearModel {
    /// Plain ordinary least squares.
    pub fn ordinary() -> Self {
        Self::ridge(0.0)
    }

    pub fn ridge(alpha: f64) -> Self {
        Self {
            alpha,
            coefficients: Vec::new(),
            intercept: 0.0,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Regress for LinearModel {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> CropResult<()> {
        if x.is_empty() || x.len() != y.len() {
            return Err(CropError::insufficient(format!(
                "linear fit needs matching non-empty inputs ({} rows, {} targets)",
                x.len(),
                y.len()
            )));
        }
        let n = x.len() as f64;
        let p = x[0].len();

        let mut x_mean = vec![0.0; p];
        for row in x {
            for (m, v) in x_mean.iter_mut().zip(row) {
                *m += v / n;
            }
        }
        let y_mean = y.iter().sum::<f64>() / n;

        let mut gram = vec![vec![0.0; p]; p];
        let mut rhs = vec![0.0; p];
        for (row, target) in x.iter().zip(y) {
            let centred: Vec<f64> = row.iter().zip(&x_mean).map(|(v, m)| v - m).collect();
            let dy = target - y_mean;
            for j in 0..p {
                rhs[j] += centred[j] * dy;
                for k in j..p {
                    gram[j][k] += centred[j] * centred[k];
                }
            }
        }
        for j in 0..p {
            for k in 0..j {
                gram[j][k] = gram[k][j];
            }
            gram[j][j] += self.alpha;
        }

        let coefficients = solve_least_squares(gram, rhs);
        self.intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_mean)
                .map(|(w, m)| w * m)
                .sum::<f64>();
        self.coefficients = coefficients;
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(w, v)| w * v)
                .sum::<f64>()
    }

    fn feature_importance(&self) -> Vec<f64> {
        self.coefficients.iter().map(|w| w.abs()).collect()
    }
}

/// Gauss-Jordan elimination with partial pivoting on a symmetric system.
///
/// Columns whose best pivot is negligible are treated as free and set to 0,
/// which still yields a least-squares solution for rank-deficient systems.
fn solve_least_squares(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Vec<f64> {
    let n = b.len();
    let scale = (0..n).map(|i| a[i][i].abs()).fold(0.0_f64, f64::max).max(1.0);
    let tol = scale * 1e-12;

    let mut pivot_row_of = vec![None; n];
    let mut row = 0;
    for col in 0..n {
        if row == n {
            break;
        }
        let (best, best_abs) = (row..n)
            .map(|r| (r, a[r][col].abs()))
            .fold((row, -1.0), |acc, cur| if cur.1 > acc.1 { cur } else { acc });
        if best_abs <= tol {
            continue;
        }
        a.swap(row, best);
        b.swap(row, best);

        let pivot = a[row][col];
        for v in &mut a[row] {
            *v /= pivot;
        }
        b[row] /= pivot;

        for r in 0..n {
            if r == row {
                continue;
            }
            let factor = a[r][col];
            if factor == 0.0 {
                continue;
            }
            for c in 0..n {
                a[r][c] -= factor * a[row][c];
            }
            b[r] -= factor * b[row];
        }
        pivot_row_of[col] = Some(row);
        row += 1;
    }

    pivot_row_of
        .into_iter()
        .map(|r| r.map_or(0.0, |r| b[r]))
        .collect()
}
