use crate::entities::metrics::{Benchmark, PerformanceMetrics};
use crate::value_objects::equity_sample::EquitySample;
use crate::value_objects::trade::Trade;
use serde::{Deserialize, Serialize};

/// Snapshot produced once per finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub symbol: String,
    pub strategy: String,
    pub initial_capital: f64,
    pub final_value: f64,
    pub final_cash: f64,
    pub final_position: f64,
    pub bars_processed: usize,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquitySample>,
    pub metrics: PerformanceMetrics,
    pub benchmark: Benchmark,
}
