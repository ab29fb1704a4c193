use chrono::NaiveDate;
use tradesim_domain::entities::simulation_config::{SimulationConfig, StrategySpec};
use tradesim_domain::errors::SimulationError;
use tradesim_domain::services::engine::executor::TradeExecutor;
use tradesim_domain::services::engine::simulation::{NeverCancel, SimulationLoop};
use tradesim_domain::services::strategy::{SignalContext, SignalSource, StrategyKind};
use tradesim_domain::value_objects::account_state::AccountState;
use tradesim_domain::value_objects::bar::PriceBar;
use tradesim_domain::value_objects::prediction::{Direction, PredictionPoint};
use tradesim_domain::value_objects::price_series::PriceSeries;
use tradesim_domain::value_objects::side::Side;
use tradesim_domain::value_objects::signal::Signal;
use tradesim_domain::value_objects::trade::Trade;

const DAY: i64 = 86_400;
const START: i64 = 1_704_067_200;

fn config(capital: f64, strategy: StrategySpec) -> SimulationConfig {
    SimulationConfig::new(
        "BTCUSD",
        NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
        NaiveDate::from_ymd_opt(2024, 3, 1).expect("date"),
        capital,
        strategy,
    )
}

struct AlwaysSell;

impl SignalSource for AlwaysSell {
    fn name(&self) -> &str {
        "always_sell"
    }

    fn decide(&mut self, _ctx: &SignalContext<'_>) -> Result<Signal, SimulationError> {
        Ok(Signal::Sell)
    }
}

struct Failing;

impl SignalSource for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn decide(&mut self, ctx: &SignalContext<'_>) -> Result<Signal, SimulationError> {
        Err(SimulationError::execution(format!("model crashed at bar {}", ctx.index)))
    }
}

#[test]
fn buy_and_hold_matches_hand_computation() {
    let cfg = config(10_000.0, StrategySpec::BuyAndHold);
    let series = PriceSeries::from_closes("BTCUSD", START, DAY, &[100.0, 110.0, 121.0]).unwrap();
    let mut source = StrategyKind::from_spec(&cfg.strategy);
    let result = SimulationLoop::new(&cfg)
        .run(&series, &[], &mut source, &NeverCancel, &mut |_| {})
        .unwrap();

    // Bar 0 only seeds returns; the single buy lands on bar 1.
    assert_eq!(result.trades.len(), 1);
    let buy = &result.trades[0];
    assert_eq!(buy.side, Side::Buy);
    assert_eq!(buy.price, 110.0);
    let quantity = (10_000.0f64 * 0.95 / 110.0).floor();
    assert_eq!(buy.quantity, quantity);
    let leftover = 10_000.0 - quantity * 110.0;
    assert!((buy.cash_after - leftover).abs() < 1e-9);

    let expected_final = leftover + quantity * 121.0;
    assert!((result.final_value - expected_final).abs() < 1e-9);
    let expected_pct = (quantity * 121.0 + leftover - 10_000.0) / 10_000.0 * 100.0;
    assert!((result.metrics.total_return_pct - expected_pct).abs() < 1e-9);

    assert!((result.benchmark.units - 100.0).abs() < 1e-12);
    assert!((result.benchmark.return_pct - 21.0).abs() < 1e-9);
}

#[test]
fn executor_refuses_buy_without_cash() {
    let executor = TradeExecutor::new(0.0, 1.0);
    let account = AccountState::new(50.0);
    let outcome = executor
        .execute(Side::Buy, &PriceBar::flat(START, 100.0), 1, &account, "test")
        .unwrap();
    assert!(outcome.is_none());
}

#[test]
fn insufficient_cash_keeps_value_flat() {
    let cfg = config(50.0, StrategySpec::BuyAndHold);
    let series = PriceSeries::from_closes("BTCUSD", START, DAY, &[100.0, 100.0, 120.0]).unwrap();
    let mut source = StrategyKind::from_spec(&cfg.strategy);
    let result = SimulationLoop::new(&cfg)
        .run(&series, &[], &mut source, &NeverCancel, &mut |_| {})
        .unwrap();
    assert!(result.trades.is_empty());
    assert!(result
        .equity_curve
        .iter()
        .all(|sample| sample.portfolio_value == 50.0));
}

#[test]
fn sell_without_position_completes_normally() {
    let cfg = config(1_000.0, StrategySpec::BuyAndHold);
    let series = PriceSeries::from_closes("BTCUSD", START, DAY, &[10.0, 11.0, 12.0, 13.0]).unwrap();
    let result = SimulationLoop::new(&cfg)
        .run(&series, &[], &mut AlwaysSell, &NeverCancel, &mut |_| {})
        .unwrap();
    assert!(result.trades.is_empty());
    assert_eq!(result.final_value, 1_000.0);
    assert_eq!(result.metrics.win_rate, 0.0);
}

#[test]
fn strategy_failure_surfaces_as_execution_error() {
    let cfg = config(1_000.0, StrategySpec::BuyAndHold);
    let series = PriceSeries::from_closes("BTCUSD", START, DAY, &[10.0, 11.0, 12.0]).unwrap();
    let err = SimulationLoop::new(&cfg)
        .run(&series, &[], &mut Failing, &NeverCancel, &mut |_| {})
        .expect_err("strategy error");
    assert_eq!(err, SimulationError::execution("model crashed at bar 1"));
}

#[test]
fn signal_driven_only_sees_past_predictions() {
    let cfg = config(10_000.0, StrategySpec::signal_driven());
    let series =
        PriceSeries::from_closes("BTCUSD", START, DAY, &[100.0, 100.0, 100.0, 100.0]).unwrap();
    // Stamped at bar 2, so the buy cannot happen on bar 1.
    let predictions = vec![
        PredictionPoint {
            timestamp: START + 2 * DAY,
            predicted_price: 110.0,
            confidence: 0.9,
            direction: Direction::Up,
        },
        PredictionPoint {
            timestamp: START + 3 * DAY,
            predicted_price: 90.0,
            confidence: 0.9,
            direction: Direction::Down,
        },
    ];
    let mut source = StrategyKind::from_spec(&cfg.strategy);
    let result = SimulationLoop::new(&cfg)
        .run(&series, &predictions, &mut source, &NeverCancel, &mut |_| {})
        .unwrap();

    let sides: Vec<(usize, Side)> = result.trades.iter().map(|t| (t.bar_index, t.side)).collect();
    assert_eq!(sides, vec![(2, Side::Buy), (3, Side::Sell)]);
    assert_eq!(result.metrics.trade_stats.round_trips, 1);
}

#[test]
fn take_profit_closes_position_with_reason() {
    let mut cfg = config(1_000.0, StrategySpec::BuyAndHold);
    cfg.take_profit = Some(0.2);
    let series =
        PriceSeries::from_closes("BTCUSD", START, DAY, &[10.0, 10.0, 11.0, 12.5, 13.0]).unwrap();
    let mut source = StrategyKind::from_spec(&cfg.strategy);
    let result = SimulationLoop::new(&cfg)
        .run(&series, &[], &mut source, &NeverCancel, &mut |_| {})
        .unwrap();
    assert_eq!(result.trades.len(), 2);
    assert_eq!(result.trades[1].reason, "take_profit");
    assert_eq!(result.trades[1].bar_index, 3);
    assert_eq!(result.metrics.win_rate, 100.0);
}

fn bullish_every_bar(bars: usize, price: f64) -> Vec<PredictionPoint> {
    (0..bars as i64)
        .map(|i| PredictionPoint {
            timestamp: START + i * DAY,
            predicted_price: price,
            confidence: 0.9,
            direction: Direction::Up,
        })
        .collect()
}

/// Buys and sells alternate, starting with a buy, and every entry respects the cap.
fn assert_alternating_within_cap(trades: &[Trade], max_position_fraction: f64) {
    for (idx, trade) in trades.iter().enumerate() {
        let expected = if idx % 2 == 0 { Side::Buy } else { Side::Sell };
        assert_eq!(trade.side, expected, "trade {idx} at bar {}", trade.bar_index);
        if trade.side == Side::Buy {
            let exposure = trade.position_after * trade.price / trade.portfolio_value_after;
            assert!(
                exposure <= max_position_fraction + 1e-9,
                "exposure {exposure} at bar {}",
                trade.bar_index
            );
        } else {
            assert_eq!(trade.position_after, 0.0);
        }
    }
}

#[test]
fn signal_driven_enters_once_while_prediction_stays_bullish() {
    let mut cfg = config(10_000.0, StrategySpec::signal_driven());
    cfg.max_position_fraction = 0.5;
    let series =
        PriceSeries::from_closes("BTCUSD", START, DAY, &[100.0, 100.0, 100.0, 100.0]).unwrap();
    let predictions = bullish_every_bar(4, 120.0);
    let mut source = StrategyKind::from_spec(&cfg.strategy);
    let result = SimulationLoop::new(&cfg)
        .run(&series, &predictions, &mut source, &NeverCancel, &mut |_| {})
        .unwrap();

    let buys: Vec<(usize, f64)> = result
        .trades
        .iter()
        .filter(|t| t.side == Side::Buy)
        .map(|t| (t.bar_index, t.quantity))
        .collect();
    assert_eq!(buys, vec![(1, 50.0)]);
    assert_eq!(result.final_position, 50.0);
    assert_eq!(result.final_cash, 5_000.0);
}

#[test]
fn signal_driven_alternates_under_repeated_predictions() {
    let mut cfg = config(10_000.0, StrategySpec::signal_driven());
    cfg.max_position_fraction = 0.5;
    let closes = vec![100.0; 13];
    let series = PriceSeries::from_closes("BTCUSD", START, DAY, &closes).unwrap();
    // Three bullish bars, three bearish bars, repeated.
    let predictions: Vec<PredictionPoint> = (1..13i64)
        .map(|i| {
            let bullish = (i - 1) / 3 % 2 == 0;
            PredictionPoint {
                timestamp: START + i * DAY,
                predicted_price: if bullish { 120.0 } else { 80.0 },
                confidence: 0.9,
                direction: if bullish { Direction::Up } else { Direction::Down },
            }
        })
        .collect();
    let mut source = StrategyKind::from_spec(&cfg.strategy);
    let result = SimulationLoop::new(&cfg)
        .run(&series, &predictions, &mut source, &NeverCancel, &mut |_| {})
        .unwrap();

    let sides: Vec<(usize, Side)> = result.trades.iter().map(|t| (t.bar_index, t.side)).collect();
    assert_eq!(
        sides,
        vec![(1, Side::Buy), (4, Side::Sell), (7, Side::Buy), (10, Side::Sell)]
    );
    assert_alternating_within_cap(&result.trades, 0.5);
}

#[test]
fn indicator_driven_alternates_on_oscillating_prices() {
    let mut cfg = config(10_000.0, StrategySpec::indicator_driven());
    cfg.max_position_fraction = 0.5;
    // A slow wave with a bar-to-bar zig-zag keeps RSI away from the extremes.
    let closes: Vec<f64> = (0..300)
        .map(|i| {
            let wave = 10.0 * (2.0 * std::f64::consts::PI * i as f64 / 60.0).sin();
            let zigzag = if i % 2 == 0 { 1.5 } else { -1.5 };
            100.0 + wave + zigzag
        })
        .collect();
    let series = PriceSeries::from_closes("BTCUSD", START, DAY, &closes).unwrap();
    let mut source = StrategyKind::from_spec(&cfg.strategy);
    let result = SimulationLoop::new(&cfg)
        .run(&series, &[], &mut source, &NeverCancel, &mut |_| {})
        .unwrap();

    assert!(
        result.trades.iter().filter(|t| t.side == Side::Buy).count() >= 2,
        "expected several entries, got {:?}",
        result.trades.iter().map(|t| (t.bar_index, t.side)).collect::<Vec<_>>()
    );
    assert_alternating_within_cap(&result.trades, 0.5);
}
