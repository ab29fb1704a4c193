use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tradesim_domain::entities::metrics::{Benchmark, PerformanceMetrics};
use tradesim_domain::entities::result::SimulationResult;
use tradesim_domain::value_objects::equity_sample::EquitySample;
use tradesim_domain::value_objects::trade::Trade;

pub fn write_trades_csv(path: &Path, trades: &[Trade]) -> Result<(), String> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|err| format!("failed to create trades csv {}: {}", path.display(), err))?;
    wtr.write_record([
        "timestamp_utc",
        "bar_index",
        "side",
        "qty",
        "price",
        "gross_value",
        "fee",
        "net_cash_delta",
        "cash_after",
        "position_after",
        "portfolio_value_after",
        "reason",
    ])
    .map_err(|err| format!("failed to write trades csv header: {}", err))?;

    for trade in trades {
        wtr.write_record([
            trade.timestamp.to_string(),
            trade.bar_index.to_string(),
            trade.side.as_str().to_uppercase(),
            trade.quantity.to_string(),
            trade.price.to_string(),
            trade.gross_value.to_string(),
            trade.fee.to_string(),
            trade.net_cash_delta.to_string(),
            trade.cash_after.to_string(),
            trade.position_after.to_string(),
            trade.portfolio_value_after.to_string(),
            trade.reason.clone(),
        ])
        .map_err(|err| format!("failed to write trades row: {}", err))?;
    }

    wtr.flush()
        .map_err(|err| format!("failed to flush trades csv: {}", err))
}

pub fn write_equity_csv(path: &Path, samples: &[EquitySample]) -> Result<(), String> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|err| format!("failed to create equity csv {}: {}", path.display(), err))?;
    wtr.write_record([
        "timestamp_utc",
        "portfolio_value",
        "daily_return",
        "drawdown_from_peak",
        "cash",
        "position",
        "close",
    ])
    .map_err(|err| format!("failed to write equity csv header: {}", err))?;

    for sample in samples {
        wtr.write_record([
            sample.date.to_string(),
            sample.portfolio_value.to_string(),
            sample.daily_return.to_string(),
            sample.drawdown_from_peak.to_string(),
            sample.cash.to_string(),
            sample.position.to_string(),
            sample.close.to_string(),
        ])
        .map_err(|err| format!("failed to write equity row: {}", err))?;
    }

    wtr.flush()
        .map_err(|err| format!("failed to flush equity csv: {}", err))
}

#[derive(Debug, Serialize)]
pub struct SummaryMeta {
    pub job_id: String,
    pub symbol: String,
    pub strategy: String,
    pub interval: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Serialize)]
struct Summary<'a> {
    meta: Option<&'a SummaryMeta>,
    config_snapshot: Option<&'a serde_json::Value>,
    initial_capital: f64,
    final_value: f64,
    final_cash: f64,
    final_position: f64,
    bars_processed: usize,
    trades: usize,
    metrics: &'a PerformanceMetrics,
    benchmark: &'a Benchmark,
}

pub fn summary_json(
    result: &SimulationResult,
    meta: Option<&SummaryMeta>,
    config_snapshot: Option<&serde_json::Value>,
) -> Result<serde_json::Value, String> {
    serde_json::to_value(Summary {
        meta,
        config_snapshot,
        initial_capital: result.initial_capital,
        final_value: result.final_value,
        final_cash: result.final_cash,
        final_position: result.final_position,
        bars_processed: result.bars_processed,
        trades: result.trades.len(),
        metrics: &result.metrics,
        benchmark: &result.benchmark,
    })
    .map_err(|err| format!("failed to serialize summary: {}", err))
}

pub fn write_summary_json(
    path: &Path,
    result: &SimulationResult,
    meta: Option<&SummaryMeta>,
    config_snapshot: Option<&serde_json::Value>,
) -> Result<(), String> {
    let json = summary_json(result, meta, config_snapshot)?;
    let json = serde_json::to_string_pretty(&json)
        .map_err(|err| format!("failed to serialize summary: {}", err))?;
    let mut file = fs::File::create(path)
        .map_err(|err| format!("failed to create summary {}: {}", path.display(), err))?;
    file.write_all(json.as_bytes())
        .map_err(|err| format!("failed to write summary: {}", err))
}
