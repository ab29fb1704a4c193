use std::time::Instant;
use tracing::{info, info_span};
use tradesim_domain::entities::result::SimulationResult;
use tradesim_domain::entities::simulation_config::{SimulationConfig, ValidationLimits};
use tradesim_domain::errors::SimulationError;
use tradesim_domain::repositories::market_data::MarketDataProvider;
use tradesim_domain::repositories::predictions::PredictionProvider;
use tradesim_domain::services::engine::simulation::{
    RunControl, SimulationLoop, SimulationProgress,
};
use tradesim_domain::services::strategy::SignalSource;
use tradesim_domain::value_objects::prediction::PredictionPoint;
use tradesim_domain::value_objects::price_series::PriceSeries;

/// Ports a single run reads from.
#[derive(Clone, Copy)]
pub struct DataPorts<'a> {
    pub market_data: &'a dyn MarketDataProvider,
    pub predictions: Option<&'a dyn PredictionProvider>,
}

pub fn load_inputs(
    config: &SimulationConfig,
    ports: DataPorts<'_>,
) -> Result<(PriceSeries, Vec<PredictionPoint>), SimulationError> {
    let stage_start = Instant::now();
    let series = ports.market_data.historical_series(
        &config.symbol,
        config.start_date,
        config.end_date,
        &config.interval,
    )?;
    metrics::histogram!("tradesim.simulation.load_series_ms")
        .record(stage_start.elapsed().as_millis() as f64);
    if series.len() < 2 {
        return Err(SimulationError::DataUnavailable(format!(
            "{} returned {} bars between {} and {}",
            config.symbol,
            series.len(),
            config.start_date,
            config.end_date
        )));
    }

    let predictions = match ports.predictions {
        Some(provider) => {
            provider.predictions(&config.symbol, config.start_date, config.end_date)?
        }
        None => Vec::new(),
    };
    Ok((series, predictions))
}

/// Loads inputs and replays them on the calling thread.
pub fn run_simulation(
    config: &SimulationConfig,
    ports: DataPorts<'_>,
    source: &mut dyn SignalSource,
    control: &dyn RunControl,
    progress_every: Option<usize>,
    on_progress: &mut dyn FnMut(&SimulationProgress),
) -> Result<SimulationResult, SimulationError> {
    let _span = info_span!(
        "run_simulation",
        symbol = %config.symbol,
        strategy = source.name(),
        interval = %config.interval
    )
    .entered();

    let (series, predictions) = load_inputs(config, ports)?;
    info!(
        bars = series.len(),
        predictions = predictions.len(),
        "inputs loaded"
    );

    let mut simulation = SimulationLoop::new(config);
    if let Some(every) = progress_every {
        simulation = simulation.with_progress_every(every);
    }

    let stage_start = Instant::now();
    let result = simulation.run(&series, &predictions, source, control, on_progress)?;
    let engine_ms = stage_start.elapsed().as_millis() as f64;
    metrics::histogram!("tradesim.simulation.engine_ms").record(engine_ms);
    metrics::gauge!("tradesim.simulation.bars_processed").set(result.bars_processed as f64);
    metrics::gauge!("tradesim.simulation.trades").set(result.trades.len() as f64);

    info!(
        final_value = result.final_value,
        trades = result.trades.len(),
        total_return_pct = result.metrics.total_return_pct,
        "simulation finished"
    );
    Ok(result)
}

/// Checks the config and that enough data exists, without running the loop.
pub fn validate(
    config: &SimulationConfig,
    limits: &ValidationLimits,
    today: chrono::NaiveDate,
    ports: DataPorts<'_>,
) -> Result<serde_json::Value, SimulationError> {
    let _span = info_span!("validate", symbol = %config.symbol).entered();

    config.validate(limits, today)?;
    let (series, predictions) = load_inputs(config, ports)?;
    let first = series.first().map(|bar| bar.timestamp);
    let last = series.last().map(|bar| bar.timestamp);

    Ok(serde_json::json!({
        "symbol": config.symbol,
        "strategy": config.strategy.name(),
        "interval": config.interval.label(),
        "start_date": config.start_date.to_string(),
        "end_date": config.end_date.to_string(),
        "bars": series.len(),
        "first_timestamp": first,
        "last_timestamp": last,
        "predictions": predictions.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::{run_simulation, validate, DataPorts};
    use chrono::NaiveDate;
    use tradesim_domain::entities::simulation_config::{
        SimulationConfig, StrategySpec, ValidationLimits,
    };
    use tradesim_domain::errors::SimulationError;
    use tradesim_domain::repositories::market_data::MarketDataProvider;
    use tradesim_domain::services::engine::simulation::NeverCancel;
    use tradesim_domain::services::strategy::StrategyKind;
    use tradesim_domain::value_objects::interval::Interval;
    use tradesim_domain::value_objects::price_series::PriceSeries;

    struct Fixed(Vec<f64>);

    impl MarketDataProvider for Fixed {
        fn historical_series(
            &self,
            symbol: &str,
            _from: NaiveDate,
            _to: NaiveDate,
            interval: &Interval,
        ) -> Result<PriceSeries, SimulationError> {
            PriceSeries::from_closes(symbol, 1_704_067_200, interval.step_seconds(), &self.0)
        }
    }

    fn config() -> SimulationConfig {
        SimulationConfig::new(
            "BTCUSD",
            NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
            NaiveDate::from_ymd_opt(2024, 1, 10).expect("date"),
            1_000.0,
            StrategySpec::BuyAndHold,
        )
    }

    #[test]
    fn runs_end_to_end_against_ports() {
        let cfg = config();
        let provider = Fixed(vec![10.0, 11.0, 12.0, 13.0]);
        let mut source = StrategyKind::from_spec(&cfg.strategy);
        let mut checkpoints = 0;
        let result = run_simulation(
            &cfg,
            DataPorts {
                market_data: &provider,
                predictions: None,
            },
            &mut source,
            &NeverCancel,
            Some(1),
            &mut |_| checkpoints += 1,
        )
        .expect("run");
        assert_eq!(result.bars_processed, 4);
        assert_eq!(result.trades.len(), 1);
        assert_eq!(checkpoints, 4);
    }

    #[test]
    fn single_bar_is_data_unavailable() {
        let cfg = config();
        let provider = Fixed(vec![10.0]);
        let mut source = StrategyKind::from_spec(&cfg.strategy);
        let err = run_simulation(
            &cfg,
            DataPorts {
                market_data: &provider,
                predictions: None,
            },
            &mut source,
            &NeverCancel,
            None,
            &mut |_| {},
        )
        .expect_err("unavailable");
        assert!(matches!(err, SimulationError::DataUnavailable(_)));
    }

    #[test]
    fn validate_reports_available_data() {
        let cfg = config();
        let provider = Fixed(vec![10.0, 11.0, 12.0]);
        let report = validate(
            &cfg,
            &ValidationLimits::default(),
            NaiveDate::from_ymd_opt(2025, 1, 1).expect("date"),
            DataPorts {
                market_data: &provider,
                predictions: None,
            },
        )
        .expect("validate");
        assert_eq!(report["bars"], 3);
        assert_eq!(report["strategy"], "buy_and_hold");
    }
}
