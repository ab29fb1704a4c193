use crate::entities::result::SimulationResult;
use crate::entities::simulation_config::SimulationConfig;
use crate::errors::SimulationError;
use crate::services::analyzer::{DrawdownTracker, PerformanceAnalyzer};
use crate::services::engine::executor::TradeExecutor;
use crate::services::engine::exits::ProtectiveExits;
use crate::services::strategy::{SignalContext, SignalSource};
use crate::value_objects::account_state::AccountState;
use crate::value_objects::equity_sample::EquitySample;
use crate::value_objects::prediction::PredictionPoint;
use crate::value_objects::price_series::PriceSeries;
use crate::value_objects::signal::Signal;
use crate::value_objects::trade::Trade;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Polled at every suspension point; `true` unwinds the run with `Cancelled`.
pub trait RunControl {
    fn should_cancel(&self) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl RunControl for NeverCancel {
    fn should_cancel(&self) -> bool {
        false
    }
}

impl RunControl for AtomicBool {
    fn should_cancel(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationProgress {
    pub bar_index: usize,
    pub total_bars: usize,
    pub pct: f64,
    pub timestamp: i64,
    pub portfolio_value: f64,
    pub drawdown: f64,
    pub trades: usize,
}

/// Replays a price series bar by bar against one signal source.
#[derive(Debug, Clone)]
pub struct SimulationLoop<'a> {
    config: &'a SimulationConfig,
    executor: TradeExecutor,
    analyzer: PerformanceAnalyzer,
    progress_every: Option<usize>,
}

impl<'a> SimulationLoop<'a> {
    pub fn new(config: &'a SimulationConfig) -> Self {
        Self {
            config,
            executor: TradeExecutor::from_config(config),
            analyzer: PerformanceAnalyzer::new(),
            progress_every: None,
        }
    }

    /// Bars between suspension points; defaults to roughly one percent of the series.
    pub fn with_progress_every(mut self, bars: usize) -> Self {
        self.progress_every = Some(bars.max(1));
        self
    }

    pub fn run(
        &self,
        series: &PriceSeries,
        predictions: &[PredictionPoint],
        source: &mut dyn SignalSource,
        control: &dyn RunControl,
        on_progress: &mut dyn FnMut(&SimulationProgress),
    ) -> Result<SimulationResult, SimulationError> {
        let bars = series.bars();
        let total_bars = bars.len();
        if total_bars < 2 {
            return Err(SimulationError::InsufficientData(format!(
                "{} has {total_bars} bars, at least 2 are required",
                series.symbol()
            )));
        }

        let mut predictions = predictions.to_vec();
        predictions.sort_by_key(|p| p.timestamp);

        let every = self
            .progress_every
            .unwrap_or_else(|| (total_bars / 100).max(1));
        let initial_capital = self.config.initial_capital;
        let strategy_name = source.name().to_string();

        let mut account = AccountState::new(initial_capital);
        let mut drawdown = DrawdownTracker::new(initial_capital);
        let mut exits = ProtectiveExits::new(self.config.stop_loss, self.config.take_profit);
        let mut ledger: Vec<Trade> = Vec::new();
        let mut equity_curve: Vec<EquitySample> = Vec::with_capacity(total_bars - 1);
        let mut prediction_cursor = 0usize;

        if control.should_cancel() {
            return Err(SimulationError::Cancelled);
        }
        on_progress(&SimulationProgress {
            bar_index: 0,
            total_bars,
            pct: 0.0,
            timestamp: bars[0].timestamp,
            portfolio_value: initial_capital,
            drawdown: 0.0,
            trades: 0,
        });

        for i in 1..total_bars {
            let bar = &bars[i];
            let prev_value = account.value_at(bars[i - 1].close);
            account.mark(bar.close);

            while prediction_cursor < predictions.len()
                && predictions[prediction_cursor].timestamp <= bar.timestamp
            {
                prediction_cursor += 1;
            }

            let (signal, reason) = match exits.triggered(account.position, bar.close) {
                Some(reason) => (Signal::Sell, reason),
                None => {
                    let ctx = SignalContext {
                        history: &bars[..=i],
                        predictions: &predictions[..prediction_cursor],
                        index: i,
                        position: account.position,
                    };
                    (source.decide(&ctx)?, strategy_name.as_str())
                }
            };

            if let Some(side) = signal.side() {
                match self.executor.execute(side, bar, i, &account, reason)? {
                    Some(trade) => {
                        account.cash = trade.cash_after;
                        account.position = trade.position_after;
                        account.mark(bar.close);
                        exits.on_trade(&trade);
                        debug!(
                            bar = i,
                            side = trade.side.as_str(),
                            qty = trade.quantity,
                            price = trade.price,
                            fee = trade.fee,
                            reason = %trade.reason,
                            "trade executed"
                        );
                        ledger.push(trade);
                    }
                    None => {
                        debug!(bar = i, side = side.as_str(), "order infeasible, holding");
                    }
                }
            }

            let drawdown_from_peak = drawdown.update(account.portfolio_value);
            let daily_return = if prev_value > 0.0 {
                account.portfolio_value / prev_value - 1.0
            } else {
                0.0
            };
            equity_curve.push(EquitySample {
                date: bar.timestamp,
                portfolio_value: account.portfolio_value,
                daily_return,
                drawdown_from_peak,
                cash: account.cash,
                position: account.position,
                close: bar.close,
            });

            if i % every == 0 {
                if control.should_cancel() {
                    debug!(bar = i, "cancellation observed");
                    return Err(SimulationError::Cancelled);
                }
                on_progress(&SimulationProgress {
                    bar_index: i,
                    total_bars,
                    pct: i as f64 / total_bars as f64 * 100.0,
                    timestamp: bar.timestamp,
                    portfolio_value: account.portfolio_value,
                    drawdown: drawdown_from_peak,
                    trades: ledger.len(),
                });
            }
        }

        let final_value = account.portfolio_value;
        let metrics =
            self.analyzer
                .analyze(initial_capital, final_value, &equity_curve, &ledger)?;
        let benchmark = self.analyzer.benchmark(
            initial_capital,
            bars[0].close,
            bars[total_bars - 1].close,
            equity_curve.len(),
        );

        Ok(SimulationResult {
            symbol: series.symbol().to_string(),
            strategy: strategy_name,
            initial_capital,
            final_value,
            final_cash: account.cash,
            final_position: account.position,
            bars_processed: total_bars,
            trades: ledger,
            equity_curve,
            metrics,
            benchmark,
        })
    }
}
