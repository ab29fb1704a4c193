use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquitySample {
    pub date: i64,
    pub portfolio_value: f64,
    pub daily_return: f64,
    pub drawdown_from_peak: f64,
    pub cash: f64,
    pub position: f64,
    pub close: f64,
}
