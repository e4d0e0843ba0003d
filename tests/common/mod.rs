#![allow(dead_code)]

use std::fs;
use std::path::Path;

use cropcast::data::domain::HistoricalRecord;
use cropcast::TrainConfig;
use serde_json::{json, Value};

/// (crop, area, production, yield, farmers) for the first year.
const BASE: [(&str, f64, f64, f64, u64); 8] = [
    ("Rice", 50_000.0, 200_000.0, 4.0, 16_500),
    ("Millet", 38_000.0, 76_000.0, 2.0, 12_600),
    ("Sorghum", 28_000.0, 56_000.0, 2.0, 8_600),
    ("Maize", 18_000.0, 36_000.0, 2.0, 6_600),
    ("Groundnuts", 85_000.0, 170_000.0, 2.0, 21_500),
    ("Cotton", 5_500.0, 8_800.0, 1.6, 2_300),
    ("Vegetables", 13_000.0, 26_000.0, 2.0, 8_600),
    ("Fruits", 9_200.0, 18_400.0, 2.0, 5_600),
];

/// Deterministic history with steady growth and a cyclical climate term.
/// Yields are left unrounded so every year's value is distinct.
pub fn records(first: i32, last: i32, crops: &[&str]) -> Vec<HistoricalRecord> {
    let mut out = Vec::new();
    for year in first..=last {
        let t = f64::from(year - 2004);
        let growth = 1.0 + t * 0.02;
        let climate = 1.0 + (t * 0.3).sin() * 0.1;
        for (crop, area, production, yld, farmers) in BASE {
            if !crops.contains(&crop) {
                continue;
            }
            out.push(HistoricalRecord {
                year,
                crop: crop.to_string(),
                area: (area * growth * climate).floor(),
                production: (production * growth * climate).floor(),
                yield_per_area: yld * (1.0 + t * 0.01),
                farmer_count: (farmers as f64 * growth) as u64,
            });
        }
    }
    out
}

pub fn all_crops() -> Vec<&'static str> {
    BASE.iter().map(|b| b.0).collect()
}

/// Smaller ensembles so the suite stays quick.
pub fn fast_config() -> TrainConfig {
    let mut cfg = TrainConfig::default();
    cfg.forest.n_estimators = 20;
    cfg.boosting.n_estimators = 30;
    cfg.first_year = 2004;
    cfg
}

pub fn input(crop: &str) -> Value {
    json!({
        "crop": crop,
        "rainfall_mm": 800,
        "temperature_c": 27,
        "humidity_percent": 70,
        "soil_ph": 6.5,
        "fertilizer_use_kg_ha": 60,
        "irrigation_area_percent": 20,
        "fuel_price_usd_liter": 1.3,
        "labor_cost_usd_day": 16,
        "market_demand_index": 100
    })
}

/// Lay records out as `<root>/<year>/crops_<year>.csv`.
pub fn write_csv_tree(root: &Path, records: &[HistoricalRecord]) {
    let mut years: Vec<i32> = records.iter().map(|r| r.year).collect();
    years.dedup();
    for year in years {
        let dir = root.join(year.to_string());
        fs::create_dir_all(&dir).unwrap();
        let mut body =
            String::from("crop,area_hectares,production_tons,yield_per_hectare,farmers_count\n");
        for r in records.iter().filter(|r| r.year == year) {
            body.push_str(&format!(
                "{},{},{},{},{}\n",
                r.crop, r.area, r.production, r.yield_per_area, r.farmer_count
            ));
        }
        fs::write(dir.join(format!("crops_{year}.csv")), body).unwrap();
    }
}
