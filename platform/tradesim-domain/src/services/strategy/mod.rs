use crate::entities::simulation_config::StrategySpec;
use crate::errors::SimulationError;
use crate::services::indicators::{rsi, sma};
use crate::value_objects::bar::PriceBar;
use crate::value_objects::prediction::PredictionPoint;
use crate::value_objects::signal::Signal;

/// What a strategy sees when asked for a decision on bar `index`.
#[derive(Debug, Clone, Copy)]
pub struct SignalContext<'a> {
    /// Bars `0..=index`; the last element is the current bar.
    pub history: &'a [PriceBar],
    /// Predictions stamped at or before the current bar, oldest first.
    pub predictions: &'a [PredictionPoint],
    pub index: usize,
    pub position: f64,
}

impl<'a> SignalContext<'a> {
    pub fn current(&self) -> Result<&'a PriceBar, SimulationError> {
        self.history
            .last()
            .ok_or_else(|| SimulationError::execution("signal requested with empty history"))
    }
}

pub trait SignalSource: Send {
    fn name(&self) -> &str;

    fn decide(&mut self, ctx: &SignalContext<'_>) -> Result<Signal, SimulationError>;
}

impl<S: SignalSource + ?Sized> SignalSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn decide(&mut self, ctx: &SignalContext<'_>) -> Result<Signal, SimulationError> {
        (**self).decide(ctx)
    }
}

/// Trades on the latest external price prediction.
#[derive(Debug, Clone)]
pub struct SignalDriven {
    confidence_threshold: f64,
    price_change_threshold: f64,
}

impl SignalDriven {
    pub fn new(confidence_threshold: f64, price_change_threshold: f64) -> Self {
        Self {
            confidence_threshold,
            price_change_threshold,
        }
    }
}

impl SignalSource for SignalDriven {
    fn name(&self) -> &str {
        "signal_driven"
    }

    fn decide(&mut self, ctx: &SignalContext<'_>) -> Result<Signal, SimulationError> {
        let bar = ctx.current()?;
        let Some(prediction) = ctx.predictions.last() else {
            return Ok(Signal::Hold);
        };
        if prediction.confidence < self.confidence_threshold {
            return Ok(Signal::Hold);
        }

        let expected_change = (prediction.predicted_price - bar.close) / bar.close;
        if !expected_change.is_finite() {
            return Err(SimulationError::execution(format!(
                "non-finite expected change at {} (predicted={}, close={})",
                bar.timestamp, prediction.predicted_price, bar.close
            )));
        }
        if expected_change.abs() < self.price_change_threshold {
            return Ok(Signal::Hold);
        }
        // Enter only when flat, exit only when long.
        if expected_change > 0.0 && ctx.position <= 0.0 {
            return Ok(Signal::Buy);
        }
        if expected_change < 0.0 && ctx.position > 0.0 {
            return Ok(Signal::Sell);
        }
        Ok(Signal::Hold)
    }
}

/// Moving-average crossover filtered by RSI.
#[derive(Debug, Clone)]
pub struct IndicatorDriven {
    short_window: usize,
    lookback: usize,
    rsi_period: usize,
    overbought: f64,
    oversold: f64,
}

impl IndicatorDriven {
    pub fn new(
        short_window: usize,
        lookback: usize,
        rsi_period: usize,
        overbought: f64,
        oversold: f64,
    ) -> Self {
        Self {
            short_window,
            lookback,
            rsi_period,
            overbought,
            oversold,
        }
    }

    /// Bars needed for both moving averages and a full `rsi_period` of changes.
    pub fn warmup_bars(&self) -> usize {
        self.lookback.max(self.rsi_period + 1)
    }
}

impl SignalSource for IndicatorDriven {
    fn name(&self) -> &str {
        "indicator_driven"
    }

    fn decide(&mut self, ctx: &SignalContext<'_>) -> Result<Signal, SimulationError> {
        if ctx.history.len() < self.warmup_bars() {
            return Ok(Signal::Hold);
        }

        let needed = self.warmup_bars();
        let closes: Vec<f64> = ctx.history[ctx.history.len() - needed..]
            .iter()
            .map(|bar| bar.close)
            .collect();

        let (Some(short), Some(long), Some(rsi)) = (
            sma(&closes, self.short_window),
            sma(&closes, self.lookback),
            rsi(&closes, self.rsi_period),
        ) else {
            return Ok(Signal::Hold);
        };

        if short > long && rsi < self.overbought && ctx.position <= 0.0 {
            return Ok(Signal::Buy);
        }
        if short < long && rsi > self.oversold && ctx.position > 0.0 {
            return Ok(Signal::Sell);
        }
        Ok(Signal::Hold)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuyAndHold {
    has_bought: bool,
}

impl BuyAndHold {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SignalSource for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn decide(&mut self, ctx: &SignalContext<'_>) -> Result<Signal, SimulationError> {
        if self.has_bought || ctx.index < 1 {
            return Ok(Signal::Hold);
        }
        self.has_bought = true;
        Ok(Signal::Buy)
    }
}

#[derive(Debug, Clone)]
pub enum StrategyKind {
    SignalDriven(SignalDriven),
    IndicatorDriven(IndicatorDriven),
    BuyAndHold(BuyAndHold),
}

impl StrategyKind {
    pub fn from_spec(spec: &StrategySpec) -> Self {
        match spec {
            StrategySpec::SignalDriven {
                confidence_threshold,
                price_change_threshold,
            } => StrategyKind::SignalDriven(SignalDriven::new(
                *confidence_threshold,
                *price_change_threshold,
            )),
            StrategySpec::IndicatorDriven {
                short_window,
                lookback,
                rsi_period,
                overbought,
                oversold,
            } => StrategyKind::IndicatorDriven(IndicatorDriven::new(
                *short_window,
                *lookback,
                *rsi_period,
                *overbought,
                *oversold,
            )),
            StrategySpec::BuyAndHold => StrategyKind::BuyAndHold(BuyAndHold::new()),
        }
    }
}

impl SignalSource for StrategyKind {
    fn name(&self) -> &str {
        match self {
            StrategyKind::SignalDriven(strategy) => strategy.name(),
            StrategyKind::IndicatorDriven(strategy) => strategy.name(),
            StrategyKind::BuyAndHold(strategy) => strategy.name(),
        }
    }

    fn decide(&mut self, ctx: &SignalContext<'_>) -> Result<Signal, SimulationError> {
        match self {
            StrategyKind::SignalDriven(strategy) => strategy.decide(ctx),
            StrategyKind::IndicatorDriven(strategy) => strategy.decide(ctx),
            StrategyKind::BuyAndHold(strategy) => strategy.decide(ctx),
        }
    }
}
