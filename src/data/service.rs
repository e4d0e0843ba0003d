//! Service layer that turns historical records into training examples.

use rand::Rng;
use tracing::debug;

use super::covariates::CovariateSynthesizer;
use super::domain::{HistoricalRecord, TrainingExample};
use super::price::PriceSynthesizer;

/// Attach synthesized covariates to every record, preserving input order.
///
/// The returned examples carry a zero price; [`assemble_with_prices`] fills it.
pub fn assemble<R: Rng + ?Sized>(
    records: &[HistoricalRecord],
    synthesizer: &CovariateSynthesizer,
    rng: &mut R,
) -> Vec<TrainingExample> {
    let table: Vec<TrainingExample> = records
        .iter()
        .map(|record| TrainingExample {
            covariates: synthesizer.synthesize(record.year, &record.crop, rng),
            record: record.clone(),
            price: 0.0,
        })
        .collect();
    debug!(ev = "data.assemble", rows = table.len());
    table
}

/// Assemble examples and derive their price targets, each step with its own random source.
pub fn assemble_with_prices<R1, R2>(
    records: &[HistoricalRecord],
    synthesizer: &CovariateSynthesizer,
    covariate_rng: &mut R1,
    pricer: &PriceSynthesizer,
    price_rng: &mut R2,
) -> Vec<TrainingExample>
where
    R1: Rng + ?Sized,
    R2: Rng + ?Sized,
{
    let mut table = assemble(records, synthesizer, covariate_rng);
    pricer.attach(&mut table, price_rng);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(year: i32, crop: &str) -> HistoricalRecord {
        HistoricalRecord {
            year,
            crop: crop.to_string(),
            area: 5000.0,
            production: 10_000.0 + f64::from(year),
            yield_per_area: 2.0,
            farmer_count: 100,
        }
    }

    #[test]
    fn preserves_order_and_record_fields() {
        let records = vec![record(2005, "Rice"), record(2004, "Millet"), record(2006, "Cotton")];
        let table = assemble(
            &records,
            &CovariateSynthesizer::default(),
            &mut StdRng::seed_from_u64(1),
        );
        assert_eq!(table.len(), 3);
        for (example, original) in table.iter().zip(&records) {
            assert_eq!(&example.record, original);
        }
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let table = assemble(&[], &CovariateSynthesizer::default(), &mut StdRng::seed_from_u64(1));
        assert!(table.is_empty());
    }

    #[test]
    fn price_seed_does_not_disturb_covariates() {
        let records: Vec<_> = (2004..2010).map(|y| record(y, "Maize")).collect();
        let synth = CovariateSynthesizer::default();
        let pricer = PriceSynthesizer::new();
        let a = assemble_with_prices(
            &records,
            &synth,
            &mut StdRng::seed_from_u64(9),
            &pricer,
            &mut StdRng::seed_from_u64(1),
        );
        let b = assemble_with_prices(
            &records,
            &synth,
            &mut StdRng::seed_from_u64(9),
            &pricer,
            &mut StdRng::seed_from_u64(2),
        );
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.covariates, y.covariates);
        }
        assert!(a.iter().zip(&b).any(|(x, y)| x.price != y.price));
    }
}
