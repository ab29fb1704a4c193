use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tradesim_domain::entities::simulation_config::{
    SimulationConfig, StrategySpec, ValidationLimits, DEFAULT_CONFIDENCE_THRESHOLD,
    DEFAULT_LOOKBACK, DEFAULT_MAX_RANGE_DAYS, DEFAULT_OVERBOUGHT, DEFAULT_OVERSOLD,
    DEFAULT_PRICE_CHANGE_THRESHOLD, DEFAULT_RSI_PERIOD, DEFAULT_SHORT_WINDOW,
};
use tradesim_domain::value_objects::interval::Interval;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub run: RunConfig,
    pub strategy: StrategyConfig,
    pub data: DataConfig,
    pub costs: Option<CostsConfig>,
    pub risk: Option<RiskConfig>,
    pub paths: Option<PathsConfig>,
    pub limits: Option<LimitsConfig>,
    pub engine: Option<EngineConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub interval: Option<String>,
    pub initial_capital: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyName {
    SignalDriven,
    IndicatorDriven,
    BuyAndHold,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct StrategyConfig {
    pub kind: StrategyName,
    pub confidence_threshold: Option<f64>,
    pub price_change_threshold: Option<f64>,
    pub short_window: Option<usize>,
    pub lookback: Option<usize>,
    pub rsi_period: Option<usize>,
    pub overbought: Option<f64>,
    pub oversold: Option<f64>,
}

impl StrategyConfig {
    pub fn to_spec(&self) -> StrategySpec {
        match self.kind {
            StrategyName::SignalDriven => StrategySpec::SignalDriven {
                confidence_threshold: self
                    .confidence_threshold
                    .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
                price_change_threshold: self
                    .price_change_threshold
                    .unwrap_or(DEFAULT_PRICE_CHANGE_THRESHOLD),
            },
            StrategyName::IndicatorDriven => StrategySpec::IndicatorDriven {
                short_window: self.short_window.unwrap_or(DEFAULT_SHORT_WINDOW),
                lookback: self.lookback.unwrap_or(DEFAULT_LOOKBACK),
                rsi_period: self.rsi_period.unwrap_or(DEFAULT_RSI_PERIOD),
                overbought: self.overbought.unwrap_or(DEFAULT_OVERBOUGHT),
                oversold: self.oversold.unwrap_or(DEFAULT_OVERSOLD),
            },
            StrategyName::BuyAndHold => StrategySpec::BuyAndHold,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    pub market_data_dir: String,
    pub predictions_path: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct CostsConfig {
    pub fee_rate: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RiskConfig {
    pub max_position_fraction: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    pub out_dir: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    pub max_range_days: Option<i64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    pub progress_every: Option<usize>,
}

impl Config {
    /// Maps the file layout onto the domain config; range checks happen at submission.
    pub fn to_simulation_config(&self) -> Result<SimulationConfig, String> {
        let interval = match self.run.interval.as_deref() {
            Some(label) => Interval::parse(label).map_err(|err| err.to_string())?,
            None => Interval::daily(),
        };
        let mut config = SimulationConfig::new(
            self.run.symbol.clone(),
            self.run.start,
            self.run.end,
            self.run.initial_capital,
            self.strategy.to_spec(),
        );
        config.interval = interval;
        if let Some(costs) = &self.costs {
            config.trading_fee_rate = costs.fee_rate;
        }
        if let Some(risk) = &self.risk {
            if let Some(fraction) = risk.max_position_fraction {
                config.max_position_fraction = fraction;
            }
            config.stop_loss = risk.stop_loss;
            config.take_profit = risk.take_profit;
        }
        Ok(config)
    }

    pub fn validation_limits(&self) -> ValidationLimits {
        ValidationLimits {
            max_range_days: self
                .limits
                .as_ref()
                .and_then(|limits| limits.max_range_days)
                .unwrap_or(DEFAULT_MAX_RANGE_DAYS),
        }
    }

    pub fn progress_every(&self) -> Option<usize> {
        self.engine.as_ref().and_then(|engine| engine.progress_every)
    }

    pub fn out_dir(&self) -> Option<&str> {
        self.paths.as_ref().map(|paths| paths.out_dir.as_str())
    }
}

/// Parses run config TOML; `origin` labels the source in error messages.
pub fn config_from_toml(contents: &str, origin: &str) -> Result<Config, String> {
    toml::from_str(contents).map_err(|err| format!("invalid run config {origin}: {err}"))
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    load_config_with_source(path).map(|(config, _)| config)
}

/// Also returns the raw TOML so a run can snapshot exactly what it was given.
pub fn load_config_with_source(path: &Path) -> Result<(Config, String), String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    let config = config_from_toml(&contents, &path.display().to_string())?;
    Ok((config, contents))
}
