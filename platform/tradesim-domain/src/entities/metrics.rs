use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub total_trades: usize,
    pub buy_count: usize,
    pub sell_count: usize,
    /// Buy->sell pairings that were closed by a sell.
    pub round_trips: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub total_fees: f64,
    pub avg_holding_bars: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub total_return_pct: f64,
    pub annualized_return: f64,
    pub annualized_return_pct: f64,
    pub trading_days: usize,
    pub avg_return: f64,
    pub volatility: f64,
    pub downside_deviation: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    /// Fraction in `[0, 1]`.
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,
    /// Longest run of samples spent below a prior peak.
    pub max_drawdown_duration: usize,
    /// Percentage in `[0, 100]`.
    pub win_rate: f64,
    pub profit_factor: f64,
    pub trade_stats: TradeStats,
}

/// Buy-and-hold over the same window as the simulated run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    pub start_price: f64,
    pub end_price: f64,
    pub units: f64,
    pub final_value: f64,
    pub return_pct: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
}
