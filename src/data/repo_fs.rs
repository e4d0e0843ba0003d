//! Filesystem-backed source of historical crop records.
//!
//! Layout: `<root>/<year>/crops_<year>.csv` with the header
//! `crop,area_hectares,production_tons,yield_per_hectare,farmers_count`.
//! Years without a directory are skipped. Cells are split on bare commas;
//! a row containing a quote is rejected rather than misread.
//!
//! TODO: accept RFC 4180 quoted cells (crop names with commas).

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::common::config::AppCfg;
use crate::common::error::{CropError, CropResult};

use super::domain::{HistoricalRecord, RecordSource};

const COLUMNS: [&str; 5] = [
    "crop",
    "area_hectares",
    "production_tons",
    "yield_per_hectare",
    "farmers_count",
];

/// Record source rooted at `cfg.data_root`.
pub struct FsRecordRepo {
    root: PathBuf,
}

impl FsRecordRepo {
    pub fn new(cfg: &AppCfg) -> Self {
        Self::at(&cfg.data_root)
    }

    pub fn at(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn crops_path(&self, year: i32) -> PathBuf {
        self.root
            .join(year.to_string())
            .join(format!("crops_{year}.csv"))
    }

    fn read_year(&self, year: i32, path: &Path) -> CropResult<Vec<HistoricalRecord>> {
        let reader = BufReader::new(File::open(path)?);
        let mut lines = reader.lines();

        let header = match lines.next() {
            Some(line) => line?,
            None => return Ok(Vec::new()),
        };
        let positions = column_positions(&header, path)?;

        let mut records = Vec::new();
        for (lineno, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let context = || format!("{}:{}", path.display(), lineno + 2);
            if line.contains('"') {
                return Err(CropError::invalid(format!(
                    "{}: quoted CSV cells are not supported",
                    context()
                )));
            }
            let cells: Vec<&str> = line.split(',').map(str::trim).collect();
            let cell = |idx: usize| cells.get(positions[idx]).copied().unwrap_or("");

            records.push(HistoricalRecord {
                year,
                crop: cell(0).to_string(),
                area: parse_number(cell(1), COLUMNS[1], &context)?,
                production: parse_number(cell(2), COLUMNS[2], &context)?,
                yield_per_area: parse_number(cell(3), COLUMNS[3], &context)?,
                farmer_count: cell(4).parse().map_err(|_| {
                    CropError::invalid(format!("{}: bad {} `{}`", context(), COLUMNS[4], cell(4)))
                })?,
            });
        }
        Ok(records)
    }
}

fn column_positions(header: &str, path: &Path) -> CropResult<[usize; 5]> {
    let names: Vec<&str> = header.split(',').map(str::trim).collect();
    let mut positions = [0usize; 5];
    for (slot, column) in positions.iter_mut().zip(COLUMNS) {
        *slot = names.iter().position(|n| *n == column).ok_or_else(|| {
            CropError::invalid(format!("{}: header lacks `{column}`", path.display()))
        })?;
    }
    Ok(positions)
}

fn parse_number(raw: &str, column: &str, context: &dyn Fn() -> String) -> CropResult<f64> {
    raw.parse()
        .map_err(|_| CropError::invalid(format!("{}: bad {column} `{raw}`", context())))
}

impl RecordSource for FsRecordRepo {
    fn load_years(&self, first: i32, last: i32) -> CropResult<Vec<HistoricalRecord>> {
        let mut all = Vec::new();
        for year in first..=last {
            let path = self.crops_path(year);
            if !path.exists() {
                debug!(ev = "data.year_missing", year);
                continue;
            }
            let mut rows = self.read_year(year, &path)?;
            debug!(ev = "data.year_loaded", year, rows = rows.len());
            all.append(&mut rows);
        }
        info!(ev = "data.load", first, last, rows = all.len());
        Ok(all)
    }
}
