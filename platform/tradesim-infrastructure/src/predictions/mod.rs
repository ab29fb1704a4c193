use crate::timestamps::{day_window, parse_timestamp};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tradesim_domain::errors::SimulationError;
use tradesim_domain::repositories::predictions::PredictionProvider;
use tradesim_domain::value_objects::prediction::{Direction, PredictionPoint};

#[derive(Debug, Deserialize)]
pub struct PredictionRecord {
    pub timestamp_utc: String,
    /// Optional column; rows without it apply to every symbol.
    #[serde(default)]
    pub symbol: Option<String>,
    pub predicted_price: f64,
    pub confidence: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PredictionLoadReport {
    pub rows: usize,
    pub invalid: usize,
}

/// Model output exported to a single CSV file.
#[derive(Debug, Clone)]
pub struct CsvPredictionProvider {
    path: PathBuf,
}

impl CsvPredictionProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PredictionProvider for CsvPredictionProvider {
    fn predictions(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PredictionPoint>, SimulationError> {
        if !self.path.exists() {
            warn!(path = %self.path.display(), "predictions file missing, running without predictions");
            return Ok(Vec::new());
        }
        let (points, report) =
            load_predictions_csv(&self.path, symbol).map_err(SimulationError::DataUnavailable)?;
        if report.invalid > 0 {
            warn!(symbol, invalid = report.invalid, "dropped invalid prediction rows");
        }

        let (start_ts, end_ts) = day_window(from, to);
        let points: Vec<PredictionPoint> = points
            .into_iter()
            .filter(|p| p.timestamp >= start_ts && p.timestamp <= end_ts)
            .collect();
        info!(symbol, rows = report.rows, predictions = points.len(), "predictions loaded");
        Ok(points)
    }
}

/// Rows for `symbol`, sorted by timestamp. Out-of-range confidences are dropped.
pub fn load_predictions_csv(
    path: &Path,
    symbol: &str,
) -> Result<(Vec<PredictionPoint>, PredictionLoadReport), String> {
    let file = File::open(path)
        .map_err(|err| format!("failed to open predictions CSV {}: {}", path.display(), err))?;
    let mut reader = csv::Reader::from_reader(file);
    let mut report = PredictionLoadReport::default();
    let mut points = Vec::new();

    for result in reader.deserialize::<PredictionRecord>() {
        let record = result.map_err(|err| {
            format!("failed to parse predictions row in {}: {}", path.display(), err)
        })?;
        report.rows += 1;
        if let Some(row_symbol) = record.symbol.as_deref() {
            if !row_symbol.eq_ignore_ascii_case(symbol) {
                continue;
            }
        }
        if !(0.0..=1.0).contains(&record.confidence)
            || !record.predicted_price.is_finite()
            || record.predicted_price <= 0.0
        {
            report.invalid += 1;
            continue;
        }
        points.push(PredictionPoint {
            timestamp: parse_timestamp(&record.timestamp_utc)?,
            predicted_price: record.predicted_price,
            confidence: record.confidence,
            direction: record.direction,
        });
    }

    points.sort_by_key(|p| p.timestamp);
    Ok((points, report))
}
