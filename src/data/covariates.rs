//! Covariate synthesis for historical records that lack environmental and
//! economic measurements.
//!
//! Each covariate mean is `base × crop_factor × (1 + Δyear × trend)`; one
//! Gaussian draw is taken around it. Soil acidity has no trend and uses a
//! per-crop target pH instead. Outputs are not clamped, so extreme years can
//! yield implausible values (negative rainfall and the like).

use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::domain::{Covariate, Covariates};

/// Year the trends are anchored to.
pub const REFERENCE_YEAR: i32 = 2001;

struct CovariateProfile {
    base: f64,
    sigma: f64,
    trend: f64,
}

fn profile(covariate: Covariate) -> CovariateProfile {
    let (base, sigma, trend) = match covariate {
        Covariate::Rainfall => (800.0, 150.0, 0.01),
        Covariate::Temperature => (27.0, 3.0, 0.002),
        Covariate::Humidity => (70.0, 10.0, 0.005),
        Covariate::SoilPh => (6.5, 0.5, 0.0),
        Covariate::FertilizerUse => (60.0, 15.0, 0.02),
        Covariate::IrrigationShare => (20.0, 8.0, 0.03),
        Covariate::FuelPrice => (1.2, 0.3, 0.05),
        Covariate::LaborCost => (15.0, 3.0, 0.03),
        Covariate::MarketDemand => (100.0, 20.0, 0.02),
    };
    CovariateProfile { base, sigma, trend }
}

/// Multiplicative crop adjustment; 1.0 for unknown crops and crop-independent covariates.
pub fn crop_factor(covariate: Covariate, crop: &str) -> f64 {
    match covariate {
        Covariate::Rainfall => match crop {
            "Rice" => 1.1,
            "Millet" => 0.9,
            "Sorghum" => 0.85,
            "Maize" => 1.0,
            "Groundnuts" => 0.95,
            "Cotton" => 1.05,
            "Vegetables" => 1.15,
            "Fruits" => 1.1,
            _ => 1.0,
        },
        Covariate::Temperature => match crop {
            "Rice" => 1.0,
            "Millet" | "Sorghum" => 1.05,
            "Maize" => 1.02,
            "Groundnuts" => 1.03,
            "Cotton" => 1.04,
            "Vegetables" => 0.98,
            "Fruits" => 0.97,
            _ => 1.0,
        },
        Covariate::Humidity => match crop {
            "Rice" => 1.15,
            "Millet" | "Sorghum" => 0.9,
            "Maize" | "Cotton" => 1.0,
            "Groundnuts" => 0.95,
            "Vegetables" => 1.1,
            "Fruits" => 1.05,
            _ => 1.0,
        },
        Covariate::FertilizerUse => match crop {
            "Rice" => 1.2,
            "Millet" | "Sorghum" => 0.8,
            "Maize" | "Fruits" => 1.1,
            "Groundnuts" => 0.9,
            "Cotton" => 1.3,
            "Vegetables" => 1.4,
            _ => 1.0,
        },
        Covariate::IrrigationShare => match crop {
            "Rice" => 1.5,
            "Millet" => 0.5,
            "Sorghum" => 0.6,
            "Maize" => 0.8,
            "Groundnuts" => 0.7,
            "Cotton" => 1.2,
            "Vegetables" => 1.8,
            "Fruits" => 1.6,
            _ => 1.0,
        },
        Covariate::MarketDemand => match crop {
            "Rice" => 1.2,
            "Millet" => 0.9,
            "Sorghum" => 0.8,
            "Maize" => 1.0,
            "Groundnuts" => 1.1,
            "Cotton" => 0.7,
            "Vegetables" => 1.3,
            "Fruits" => 1.4,
            _ => 1.0,
        },
        Covariate::SoilPh | Covariate::FuelPrice | Covariate::LaborCost => 1.0,
    }
}

/// Preferred soil pH per crop.
pub fn target_soil_ph(crop: &str) -> f64 {
    match crop {
        "Rice" => 6.0,
        "Millet" | "Vegetables" => 6.8,
        "Sorghum" => 6.7,
        "Maize" => 6.5,
        "Groundnuts" => 6.2,
        "Cotton" => 6.3,
        "Fruits" => 6.6,
        _ => profile(Covariate::SoilPh).base,
    }
}

/// Draws covariates for a (year, crop) pair from an explicitly passed random source.
#[derive(Clone, Debug)]
pub struct CovariateSynthesizer {
    reference_year: i32,
}

impl Default for CovariateSynthesizer {
    fn default() -> Self {
        Self::new(REFERENCE_YEAR)
    }
}

impl CovariateSynthesizer {
    pub fn new(reference_year: i32) -> Self {
        Self { reference_year }
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    /// Deterministic mean of the distribution a covariate is drawn from.
    pub fn mean(&self, covariate: Covariate, year: i32, crop: &str) -> f64 {
        if covariate == Covariate::SoilPh {
            return target_soil_ph(crop);
        }
        let p = profile(covariate);
        let years = f64::from(year - self.reference_year);
        p.base * crop_factor(covariate, crop) * (1.0 + years * p.trend)
    }

    /// Fixed standard deviation for a covariate.
    pub fn sigma(&self, covariate: Covariate) -> f64 {
        profile(covariate).sigma
    }

    /// One draw per covariate, in [`Covariate::ALL`] order.
    pub fn synthesize<R: Rng + ?Sized>(&self, year: i32, crop: &str, rng: &mut R) -> Covariates {
        let mut values = [0.0; 9];
        for (slot, covariate) in values.iter_mut().zip(Covariate::ALL) {
            *slot = draw_normal(self.mean(covariate, year, crop), self.sigma(covariate), rng);
        }
        Covariates::from_values(values)
    }
}

/// Single Gaussian draw; `sigma` comes from the fixed tables so it is always finite and positive.
pub(crate) fn draw_normal<R: Rng + ?Sized>(mean: f64, sigma: f64, rng: &mut R) -> f64 {
    match Normal::new(mean, sigma) {
        Ok(dist) => dist.sample(rng),
        Err(_) => mean,
    }
}
