pub mod drawdown;

use crate::entities::metrics::{Benchmark, PerformanceMetrics, TradeStats};
use crate::errors::SimulationError;
use crate::value_objects::equity_sample::EquitySample;
use crate::value_objects::side::Side;
use crate::value_objects::trade::Trade;

pub use drawdown::DrawdownTracker;

pub const DAYS_PER_YEAR: f64 = 365.0;
/// Volatility assumed for the benchmark's naive Sharpe ratio.
pub const BENCHMARK_ANNUAL_VOLATILITY: f64 = 0.16;
/// Reported profit factor when there were wins and no losses.
pub const PROFIT_FACTOR_CAP: f64 = 999.0;

/// Derives the performance report from a finished run. Stateless and pure.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceAnalyzer;

impl PerformanceAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(
        &self,
        initial_capital: f64,
        final_value: f64,
        equity_curve: &[EquitySample],
        trades: &[Trade],
    ) -> Result<PerformanceMetrics, SimulationError> {
        if equity_curve.len() < 2 {
            return Err(SimulationError::InsufficientData(format!(
                "equity curve has {} samples, at least 2 are required",
                equity_curve.len()
            )));
        }
        if !initial_capital.is_finite() || initial_capital <= 0.0 {
            return Err(SimulationError::validation("initial_capital must be > 0"));
        }

        let trading_days = equity_curve.len();
        let total_return = final_value - initial_capital;
        let total_return_pct = total_return / initial_capital * 100.0;
        let annualized_return = annualize(initial_capital, final_value, trading_days);

        let returns: Vec<f64> = equity_curve.iter().map(|s| s.daily_return).collect();
        let (avg_return, std_return) = mean_std(&returns);
        let annual_factor = DAYS_PER_YEAR.sqrt();
        let volatility = std_return * annual_factor;
        let sharpe_ratio = if std_return > 0.0 {
            (avg_return * annual_factor) / (std_return * annual_factor)
        } else {
            0.0
        };

        let negative: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
        let (_, downside_std) = mean_std(&negative);
        let downside_deviation = downside_std * annual_factor;
        let sortino_ratio = if !negative.is_empty() && downside_std > 0.0 {
            (avg_return * annual_factor) / (downside_std * annual_factor)
        } else {
            0.0
        };

        let mut drawdown = DrawdownTracker::new(initial_capital);
        for sample in equity_curve {
            drawdown.update(sample.portfolio_value);
        }
        let max_drawdown = drawdown.max_drawdown();
        let calmar_ratio = if max_drawdown > 0.0 {
            annualized_return / max_drawdown
        } else {
            0.0
        };

        let trade_stats = trade_stats(trades);
        let win_rate = if trade_stats.round_trips > 0 {
            trade_stats.winning_trades as f64 / trade_stats.round_trips as f64 * 100.0
        } else {
            0.0
        };
        let profit_factor = if trade_stats.gross_loss > 0.0 {
            trade_stats.gross_profit / trade_stats.gross_loss
        } else if trade_stats.gross_profit > 0.0 {
            PROFIT_FACTOR_CAP
        } else {
            1.0
        };

        Ok(PerformanceMetrics {
            initial_capital,
            final_value,
            total_return,
            total_return_pct,
            annualized_return,
            annualized_return_pct: annualized_return * 100.0,
            trading_days,
            avg_return,
            volatility,
            downside_deviation,
            sharpe_ratio,
            sortino_ratio,
            calmar_ratio,
            max_drawdown,
            max_drawdown_pct: max_drawdown * 100.0,
            max_drawdown_duration: drawdown.longest_run(),
            win_rate,
            profit_factor,
            trade_stats,
        })
    }

    /// Buy-and-hold of `initial_capital / start_price` units over the same window.
    pub fn benchmark(
        &self,
        initial_capital: f64,
        start_price: f64,
        end_price: f64,
        trading_days: usize,
    ) -> Benchmark {
        if start_price <= 0.0 || initial_capital <= 0.0 {
            return Benchmark {
                start_price,
                end_price,
                ..Benchmark::default()
            };
        }
        let units = initial_capital / start_price;
        let final_value = units * end_price;
        let annualized_return = annualize(initial_capital, final_value, trading_days);
        Benchmark {
            start_price,
            end_price,
            units,
            final_value,
            return_pct: (final_value / initial_capital - 1.0) * 100.0,
            annualized_return,
            sharpe_ratio: annualized_return / BENCHMARK_ANNUAL_VOLATILITY,
        }
    }
}

fn annualize(initial_capital: f64, final_value: f64, trading_days: usize) -> f64 {
    let days = trading_days.max(1) as f64;
    let growth = (final_value / initial_capital).max(0.0);
    growth.powf(DAYS_PER_YEAR / days) - 1.0
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Pairs every sell with the buys accumulated since the previous sell.
fn trade_stats(trades: &[Trade]) -> TradeStats {
    let mut stats = TradeStats {
        total_trades: trades.len(),
        ..TradeStats::default()
    };

    let mut open_cost = 0.0f64;
    let mut open_since: Option<usize> = None;
    let mut holding_bars: Vec<usize> = Vec::new();

    for trade in trades {
        stats.total_fees += trade.fee;
        match trade.side {
            Side::Buy => {
                stats.buy_count += 1;
                open_cost += -trade.net_cash_delta;
                if open_since.is_none() {
                    open_since = Some(trade.bar_index);
                }
            }
            Side::Sell => {
                stats.sell_count += 1;
                let Some(entry_bar) = open_since.take() else {
                    continue;
                };
                let pnl = trade.net_cash_delta - open_cost;
                open_cost = 0.0;
                stats.round_trips += 1;
                holding_bars.push(trade.bar_index.saturating_sub(entry_bar));
                if pnl > 0.0 {
                    stats.winning_trades += 1;
                    stats.gross_profit += pnl;
                    stats.largest_win = stats.largest_win.max(pnl);
                } else if pnl < 0.0 {
                    stats.losing_trades += 1;
                    stats.gross_loss += -pnl;
                    stats.largest_loss = stats.largest_loss.min(pnl);
                }
            }
        }
    }

    if stats.winning_trades > 0 {
        stats.avg_win = stats.gross_profit / stats.winning_trades as f64;
    }
    if stats.losing_trades > 0 {
        stats.avg_loss = -stats.gross_loss / stats.losing_trades as f64;
    }
    if !holding_bars.is_empty() {
        let total: usize = holding_bars.iter().sum();
        stats.avg_holding_bars = Some(total as f64 / holding_bars.len() as f64);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::{PerformanceAnalyzer, PROFIT_FACTOR_CAP};
    use crate::errors::SimulationError;
    use crate::value_objects::equity_sample::EquitySample;
    use crate::value_objects::side::Side;
    use crate::value_objects::trade::Trade;

    fn curve(values: &[f64], initial: f64) -> Vec<EquitySample> {
        let mut prev = initial;
        values
            .iter()
            .enumerate()
            .map(|(idx, value)| {
                let sample = EquitySample {
                    date: idx as i64,
                    portfolio_value: *value,
                    daily_return: value / prev - 1.0,
                    drawdown_from_peak: 0.0,
                    cash: *value,
                    position: 0.0,
                    close: 1.0,
                };
                prev = *value;
                sample
            })
            .collect()
    }

    fn trade(side: Side, bar_index: usize, net_cash_delta: f64) -> Trade {
        Trade {
            timestamp: bar_index as i64,
            bar_index,
            side,
            price: 10.0,
            quantity: 1.0,
            gross_value: 10.0,
            fee: 0.5,
            net_cash_delta,
            cash_after: 0.0,
            position_after: 0.0,
            portfolio_value_after: 0.0,
            reason: "test".to_string(),
        }
    }

    #[test]
    fn rejects_short_curve() {
        let analyzer = PerformanceAnalyzer::new();
        let err = analyzer
            .analyze(100.0, 100.0, &curve(&[100.0], 100.0), &[])
            .expect_err("too short");
        assert!(matches!(err, SimulationError::InsufficientData(_)));
    }

    #[test]
    fn computes_returns_and_drawdown() {
        let analyzer = PerformanceAnalyzer::new();
        let samples = curve(&[110.0, 99.0, 94.05, 121.0], 100.0);
        let metrics = analyzer.analyze(100.0, 121.0, &samples, &[]).unwrap();
        assert!((metrics.total_return - 21.0).abs() < 1e-12);
        assert!((metrics.total_return_pct - 21.0).abs() < 1e-9);
        assert!((metrics.max_drawdown - 15.95 / 110.0).abs() < 1e-12);
        assert_eq!(metrics.max_drawdown_duration, 2);
        assert_eq!(metrics.trading_days, 4);
        assert!(metrics.sharpe_ratio > 0.0);
        assert!(metrics.sortino_ratio > 0.0);
        assert!(metrics.calmar_ratio > 0.0);
        assert_eq!(metrics.win_rate, 0.0);
        assert_eq!(metrics.profit_factor, 1.0);
    }

    #[test]
    fn flat_curve_has_zero_ratios() {
        let analyzer = PerformanceAnalyzer::new();
        let samples = curve(&[100.0, 100.0, 100.0], 100.0);
        let metrics = analyzer.analyze(100.0, 100.0, &samples, &[]).unwrap();
        assert_eq!(metrics.sharpe_ratio, 0.0);
        assert_eq!(metrics.sortino_ratio, 0.0);
        assert_eq!(metrics.calmar_ratio, 0.0);
        assert_eq!(metrics.max_drawdown, 0.0);
    }

    #[test]
    fn pairs_sells_with_accumulated_buys() {
        let analyzer = PerformanceAnalyzer::new();
        let trades = vec![
            trade(Side::Buy, 1, -50.0),
            trade(Side::Buy, 2, -50.0),
            trade(Side::Sell, 4, 120.0),
            trade(Side::Buy, 5, -100.0),
            trade(Side::Sell, 6, 90.0),
        ];
        let samples = curve(&[100.0, 100.0], 100.0);
        let metrics = analyzer.analyze(100.0, 100.0, &samples, &trades).unwrap();
        let stats = &metrics.trade_stats;
        assert_eq!(stats.round_trips, 2);
        assert_eq!(stats.winning_trades, 1);
        assert_eq!(stats.losing_trades, 1);
        assert!((stats.gross_profit - 20.0).abs() < 1e-12);
        assert!((stats.gross_loss - 10.0).abs() < 1e-12);
        assert_eq!(stats.avg_holding_bars, Some(2.0));
        assert!((stats.total_fees - 2.5).abs() < 1e-12);
        assert_eq!(metrics.win_rate, 50.0);
        assert!((metrics.profit_factor - 2.0).abs() < 1e-12);
    }

    #[test]
    fn profit_factor_caps_without_losses() {
        let analyzer = PerformanceAnalyzer::new();
        let trades = vec![trade(Side::Buy, 1, -50.0), trade(Side::Sell, 2, 60.0)];
        let samples = curve(&[100.0, 110.0], 100.0);
        let metrics = analyzer.analyze(100.0, 110.0, &samples, &trades).unwrap();
        assert_eq!(metrics.profit_factor, PROFIT_FACTOR_CAP);
        assert_eq!(metrics.win_rate, 100.0);
    }

    #[test]
    fn benchmark_buys_and_holds() {
        let analyzer = PerformanceAnalyzer::new();
        let benchmark = analyzer.benchmark(10_000.0, 100.0, 121.0, 2);
        assert!((benchmark.units - 100.0).abs() < 1e-12);
        assert!((benchmark.final_value - 12_100.0).abs() < 1e-9);
        assert!((benchmark.return_pct - 21.0).abs() < 1e-9);
        assert!(
            (benchmark.sharpe_ratio - benchmark.annualized_return / 0.16).abs() < 1e-12
        );
    }
}
