use crate::errors::SimulationError;
use crate::value_objects::interval::Interval;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;
pub const DEFAULT_PRICE_CHANGE_THRESHOLD: f64 = 0.02;
pub const DEFAULT_SHORT_WINDOW: usize = 10;
pub const DEFAULT_LOOKBACK: usize = 20;
pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_OVERBOUGHT: f64 = 70.0;
pub const DEFAULT_OVERSOLD: f64 = 30.0;
pub const DEFAULT_MAX_RANGE_DAYS: i64 = 3650;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategySpec {
    SignalDriven {
        confidence_threshold: f64,
        price_change_threshold: f64,
    },
    IndicatorDriven {
        short_window: usize,
        lookback: usize,
        rsi_period: usize,
        overbought: f64,
        oversold: f64,
    },
    BuyAndHold,
}

impl StrategySpec {
    pub fn signal_driven() -> Self {
        StrategySpec::SignalDriven {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            price_change_threshold: DEFAULT_PRICE_CHANGE_THRESHOLD,
        }
    }

    pub fn indicator_driven() -> Self {
        StrategySpec::IndicatorDriven {
            short_window: DEFAULT_SHORT_WINDOW,
            lookback: DEFAULT_LOOKBACK,
            rsi_period: DEFAULT_RSI_PERIOD,
            overbought: DEFAULT_OVERBOUGHT,
            oversold: DEFAULT_OVERSOLD,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrategySpec::SignalDriven { .. } => "signal_driven",
            StrategySpec::IndicatorDriven { .. } => "indicator_driven",
            StrategySpec::BuyAndHold => "buy_and_hold",
        }
    }

    fn validate(&self) -> Result<(), SimulationError> {
        match self {
            StrategySpec::SignalDriven {
                confidence_threshold,
                price_change_threshold,
            } => {
                if !(0.0..=1.0).contains(confidence_threshold) {
                    return Err(SimulationError::validation(
                        "strategy.confidence_threshold must be within [0, 1]",
                    ));
                }
                if !price_change_threshold.is_finite() || *price_change_threshold < 0.0 {
                    return Err(SimulationError::validation(
                        "strategy.price_change_threshold must be finite and >= 0",
                    ));
                }
            }
            StrategySpec::IndicatorDriven {
                short_window,
                lookback,
                rsi_period,
                overbought,
                oversold,
            } => {
                if *short_window == 0 || *lookback == 0 || *rsi_period == 0 {
                    return Err(SimulationError::validation(
                        "strategy windows (short_window, lookback, rsi_period) must be >= 1",
                    ));
                }
                if short_window >= lookback {
                    return Err(SimulationError::validation(
                        "strategy.short_window must be smaller than strategy.lookback",
                    ));
                }
                if !(0.0..=100.0).contains(oversold)
                    || !(0.0..=100.0).contains(overbought)
                    || oversold >= overbought
                {
                    return Err(SimulationError::validation(
                        "strategy RSI bounds must satisfy 0 <= oversold < overbought <= 100",
                    ));
                }
            }
            StrategySpec::BuyAndHold => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationLimits {
    pub max_range_days: i64,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_range_days: DEFAULT_MAX_RANGE_DAYS,
        }
    }
}

/// Immutable run parameters, validated once at job creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub interval: Interval,
    pub initial_capital: f64,
    pub strategy: StrategySpec,
    pub trading_fee_rate: f64,
    pub max_position_fraction: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl SimulationConfig {
    /// Defaults: no fee, full position sizing, no protective exits.
    pub fn new(
        symbol: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        initial_capital: f64,
        strategy: StrategySpec,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            start_date,
            end_date,
            interval: Interval::daily(),
            initial_capital,
            strategy,
            trading_fee_rate: 0.0,
            max_position_fraction: 1.0,
            stop_loss: None,
            take_profit: None,
        }
    }

    pub fn validate(&self, limits: &ValidationLimits, today: NaiveDate) -> Result<(), SimulationError> {
        if self.symbol.trim().is_empty() {
            return Err(SimulationError::validation("symbol must not be empty"));
        }
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(SimulationError::validation("initial_capital must be > 0"));
        }
        if self.start_date >= self.end_date {
            return Err(SimulationError::validation(format!(
                "start_date ({}) must be before end_date ({})",
                self.start_date, self.end_date
            )));
        }
        if self.end_date > today {
            return Err(SimulationError::validation(format!(
                "end_date ({}) is in the future",
                self.end_date
            )));
        }
        let range_days = (self.end_date - self.start_date).num_days();
        if range_days > limits.max_range_days {
            return Err(SimulationError::validation(format!(
                "date range of {range_days} days exceeds the maximum of {} days",
                limits.max_range_days
            )));
        }
        if !self.trading_fee_rate.is_finite() || self.trading_fee_rate < 0.0 {
            return Err(SimulationError::validation(
                "trading_fee_rate must be finite and >= 0",
            ));
        }
        if !self.max_position_fraction.is_finite()
            || self.max_position_fraction <= 0.0
            || self.max_position_fraction > 1.0
        {
            return Err(SimulationError::validation(
                "max_position_fraction must be within (0, 1]",
            ));
        }
        if let Some(stop_loss) = self.stop_loss {
            if !(stop_loss > 0.0 && stop_loss < 1.0) {
                return Err(SimulationError::validation("stop_loss must be within (0, 1)"));
            }
        }
        if let Some(take_profit) = self.take_profit {
            if !take_profit.is_finite() || take_profit <= 0.0 {
                return Err(SimulationError::validation("take_profit must be > 0"));
            }
        }
        self.strategy.validate()
    }
}
