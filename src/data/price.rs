//! Synthetic price target: falls as production volume grows, rises with
//! market demand, with multiplicative Gaussian noise and a hard floor.

use rand::Rng;

use super::covariates::draw_normal;
use super::domain::TrainingExample;

/// Lowest price the synthesizer ever emits, in currency units per ton.
pub const MIN_PRICE: f64 = 100.0;

const DEFAULT_BASE_PRICE: f64 = 300.0;
const PRODUCTION_SCALE: f64 = 100_000.0;
const NOISE_SIGMA: f64 = 0.1;

/// Per-crop base price per ton.
pub fn base_price(crop: &str) -> f64 {
    match crop {
        "Rice" => 300.0,
        "Millet" => 250.0,
        "Sorghum" => 240.0,
        "Maize" => 280.0,
        "Groundnuts" => 400.0,
        "Cotton" => 800.0,
        "Vegetables" => 500.0,
        "Fruits" => 600.0,
        _ => DEFAULT_BASE_PRICE,
    }
}

#[derive(Clone, Debug, Default)]
pub struct PriceSynthesizer;

impl PriceSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Price before noise and flooring.
    pub fn expected_price(&self, crop: &str, production: f64, market_demand_index: f64) -> f64 {
        let production_factor = 1.0 / (1.0 + production / PRODUCTION_SCALE);
        let demand_factor = market_demand_index / 100.0;
        base_price(crop) * production_factor * demand_factor
    }

    /// One price per example, one noise draw each, in table order.
    pub fn price_for<R: Rng + ?Sized>(&self, table: &[TrainingExample], rng: &mut R) -> Vec<f64> {
        table
            .iter()
            .map(|example| {
                let expected = self.expected_price(
                    &example.record.crop,
                    example.record.production,
                    example.covariates.market_demand_index,
                );
                let noise = draw_normal(1.0, NOISE_SIGMA, rng);
                (expected * noise).max(MIN_PRICE)
            })
            .collect()
    }

    /// Fill the `price` field of every example in place.
    pub fn attach<R: Rng + ?Sized>(&self, table: &mut [TrainingExample], rng: &mut R) {
        let prices = self.price_for(table, rng);
        for (example, price) in table.iter_mut().zip(prices) {
            example.price = price;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::domain::{Covariates, HistoricalRecord};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn example(crop: &str, production: f64, demand: f64) -> TrainingExample {
        let mut covariates = Covariates::from_values([0.0; 9]);
        covariates.market_demand_index = demand;
        TrainingExample {
            record: HistoricalRecord {
                year: 2010,
                crop: crop.to_string(),
                area: 1000.0,
                production,
                yield_per_area: 2.0,
                farmer_count: 10,
            },
            covariates,
            price: 0.0,
        }
    }

    #[test]
    fn expected_price_formula() {
        let synth = PriceSynthesizer::new();
        let price = synth.expected_price("Cotton", 100_000.0, 150.0);
        assert!((price - 800.0 * 0.5 * 1.5).abs() < 1e-9);
        assert_eq!(synth.expected_price("Quinoa", 0.0, 100.0), 300.0);
    }

    #[test]
    fn prices_never_fall_below_floor() {
        let synth = PriceSynthesizer::new();
        let table: Vec<_> = (0..200)
            .map(|i| example("Sorghum", 2_000_000.0 + f64::from(i), 20.0))
            .collect();
        let prices = synth.price_for(&table, &mut StdRng::seed_from_u64(3));
        assert_eq!(prices.len(), table.len());
        assert!(prices.iter().all(|p| *p >= MIN_PRICE));
    }

    #[test]
    fn price_is_row_aligned_and_noisy() {
        let synth = PriceSynthesizer::new();
        let mut table = vec![example("Fruits", 10_000.0, 140.0); 50];
        synth.attach(&mut table, &mut StdRng::seed_from_u64(5));
        let expected = synth.expected_price("Fruits", 10_000.0, 140.0);
        let mean = table.iter().map(|e| e.price).sum::<f64>() / 50.0;
        assert!((mean / expected - 1.0).abs() < 0.05);
        assert!(table.windows(2).any(|w| w[0].price != w[1].price));
    }
}
