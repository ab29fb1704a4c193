mod in_memory;

pub use in_memory::InMemoryMarketData;

use crate::timestamps::{day_window, parse_timestamp};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use tradesim_domain::errors::SimulationError;
use tradesim_domain::repositories::market_data::MarketDataProvider;
use tradesim_domain::value_objects::bar::PriceBar;
use tradesim_domain::value_objects::interval::Interval;
use tradesim_domain::value_objects::price_series::PriceSeries;

#[derive(Debug, Deserialize)]
pub struct OhlcvRecord {
    pub timestamp_utc: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataQualityReport {
    pub rows: usize,
    pub duplicates: usize,
    pub out_of_order: usize,
    pub invalid_bars: usize,
    pub gaps: usize,
    /// Bars missing inside the gaps, at the expected step.
    pub missing_bars: usize,
    pub first_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
    pub max_gap_seconds: Option<i64>,
}

impl DataQualityReport {
    pub fn is_clean(&self) -> bool {
        self.duplicates == 0 && self.out_of_order == 0 && self.invalid_bars == 0 && self.gaps == 0
    }
}

/// Reads `<SYMBOL>.csv` files from one directory.
#[derive(Debug, Clone)]
pub struct CsvMarketDataProvider {
    dir: PathBuf,
}

impl CsvMarketDataProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> Option<PathBuf> {
        [symbol.to_string(), symbol.to_uppercase(), symbol.to_lowercase()]
            .iter()
            .map(|name| self.dir.join(format!("{name}.csv")))
            .find(|path| path.exists())
    }
}

impl MarketDataProvider for CsvMarketDataProvider {
    fn historical_series(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
        interval: &Interval,
    ) -> Result<PriceSeries, SimulationError> {
        let path = self.path_for(symbol).ok_or_else(|| {
            SimulationError::DataUnavailable(format!(
                "no CSV for {symbol} in {}",
                self.dir.display()
            ))
        })?;

        let stage_start = Instant::now();
        let (bars, report) = load_csv_with_step(&path, Some(interval.step_seconds()))
            .map_err(SimulationError::DataUnavailable)?;
        metrics::histogram!("tradesim.market_data.load_csv_ms")
            .record(stage_start.elapsed().as_millis() as f64);

        if !report.is_clean() {
            warn!(
                symbol,
                path = %path.display(),
                duplicates = report.duplicates,
                out_of_order = report.out_of_order,
                invalid_bars = report.invalid_bars,
                gaps = report.gaps,
                missing_bars = report.missing_bars,
                "market data quality issues"
            );
        }

        let (start_ts, end_ts) = day_window(from, to);
        let bars: Vec<PriceBar> = bars
            .into_iter()
            .filter(|bar| bar.timestamp >= start_ts && bar.timestamp <= end_ts)
            .collect();
        info!(symbol, rows = report.rows, bars = bars.len(), "market data loaded");

        if bars.len() < 2 {
            return Err(SimulationError::DataUnavailable(format!(
                "{symbol} has {} bars between {from} and {to}",
                bars.len()
            )));
        }
        PriceSeries::new(symbol, bars)
    }
}

pub fn load_csv(path: &Path) -> Result<(Vec<PriceBar>, DataQualityReport), String> {
    load_csv_with_step(path, None)
}

/// Sorted, de-duplicated bars (last row wins) plus a quality report.
pub fn load_csv_with_step(
    path: &Path,
    expected_step_seconds: Option<i64>,
) -> Result<(Vec<PriceBar>, DataQualityReport), String> {
    let file = File::open(path)
        .map_err(|err| format!("failed to open OHLCV CSV {}: {}", path.display(), err))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut bars_by_ts: BTreeMap<i64, PriceBar> = BTreeMap::new();
    let mut report = DataQualityReport::default();
    let mut last_seen_ts: Option<i64> = None;
    let step = expected_step_seconds.unwrap_or(1).max(1);

    for result in reader.deserialize::<OhlcvRecord>() {
        let record = result.map_err(|err| {
            format!("failed to parse CSV row in {}: {}", path.display(), err)
        })?;
        report.rows += 1;
        let timestamp = parse_timestamp(&record.timestamp_utc)?;
        let bar = PriceBar {
            timestamp,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        };
        if bar.validate().is_err() {
            report.invalid_bars += 1;
            continue;
        }

        if let Some(prev) = last_seen_ts {
            if timestamp < prev {
                report.out_of_order += 1;
            }
        }
        last_seen_ts = Some(timestamp);

        if bars_by_ts.insert(timestamp, bar).is_some() {
            report.duplicates += 1;
        }
    }

    let mut bars = Vec::with_capacity(bars_by_ts.len());
    let mut max_gap: Option<i64> = None;
    for (timestamp, bar) in bars_by_ts {
        if report.first_timestamp.is_none() {
            report.first_timestamp = Some(timestamp);
        }
        if let Some(prev) = report.last_timestamp {
            let diff = timestamp - prev;
            if diff > step {
                report.gaps += 1;
                report.missing_bars += ((diff - 1) / step) as usize;
                max_gap = Some(max_gap.map_or(diff, |current| current.max(diff)));
            }
        }
        report.last_timestamp = Some(timestamp);
        bars.push(bar);
    }

    report.max_gap_seconds = max_gap;
    Ok((bars, report))
}
