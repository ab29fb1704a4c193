use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tradesim_domain::entities::job::JobId;
use tradesim_domain::entities::simulation_config::{SimulationConfig, StrategySpec};
use tradesim_domain::repositories::market_data::MarketDataProvider;
use tradesim_domain::repositories::result_sink::ResultSink;
use tradesim_domain::services::engine::simulation::{NeverCancel, SimulationLoop};
use tradesim_domain::services::strategy::StrategyKind;
use tradesim_infrastructure::artifacts::FilesystemResultSink;
use tradesim_infrastructure::market_data::CsvMarketDataProvider;

fn unique_tmp_dir(name: &str) -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let dir = std::env::temp_dir().join(format!("tradesim_{name}_{}_{}", std::process::id(), now));
    fs::create_dir_all(&dir).expect("create tmp dir");
    dir
}

#[test]
fn csv_in_artifacts_out() {
    let data_dir = unique_tmp_dir("it_data");
    let mut csv_data = String::from("timestamp_utc,open,high,low,close,volume\n");
    for day in 1..=20u32 {
        let close = 100.0 + f64::from(day);
        csv_data.push_str(&format!("2024-01-{day:02},{close},{close},{close},{close},10\n"));
    }
    fs::write(data_dir.join("BTCUSD.csv"), csv_data).expect("write csv");

    let config = SimulationConfig::new(
        "BTCUSD",
        NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
        NaiveDate::from_ymd_opt(2024, 1, 20).expect("date"),
        10_000.0,
        StrategySpec::BuyAndHold,
    );
    let provider = CsvMarketDataProvider::new(&data_dir);
    let series = provider
        .historical_series(
            &config.symbol,
            config.start_date,
            config.end_date,
            &config.interval,
        )
        .expect("series");
    assert_eq!(series.len(), 20);

    let mut source = StrategyKind::from_spec(&config.strategy);
    let result = SimulationLoop::new(&config)
        .run(&series, &[], &mut source, &NeverCancel, &mut |_| {})
        .expect("run");

    let out_dir = unique_tmp_dir("it_out");
    let config_toml = "[run]\nsymbol = \"BTCUSD\"\n";
    let sink = FilesystemResultSink::new(&out_dir).with_config_toml(config_toml);
    let job_id = JobId::new("job-it");
    sink.persist(&job_id, &config, &result).expect("persist");

    let job_dir = sink.job_dir(&job_id);
    let trades = fs::read_to_string(job_dir.join("trades.csv")).expect("trades");
    assert_eq!(trades.lines().count(), 1 + result.trades.len());
    let equity = fs::read_to_string(job_dir.join("equity.csv")).expect("equity");
    assert_eq!(equity.lines().count(), 1 + result.equity_curve.len());

    let summary: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(job_dir.join("summary.json")).expect("summary"),
    )
    .expect("summary json");
    assert_eq!(summary["meta"]["job_id"], "job-it");
    assert_eq!(summary["config_snapshot"]["strategy"]["kind"], "buy_and_hold");
    assert_eq!(summary["bars_processed"], 20);
    let snapshot = fs::read_to_string(job_dir.join("config.toml")).expect("config snapshot");
    assert_eq!(snapshot, config_toml);
}

#[test]
fn sink_without_config_text_skips_snapshot() {
    let config = SimulationConfig::new(
        "BTCUSD",
        NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
        NaiveDate::from_ymd_opt(2024, 1, 3).expect("date"),
        1_000.0,
        StrategySpec::BuyAndHold,
    );
    let series = tradesim_domain::value_objects::price_series::PriceSeries::from_closes(
        "BTCUSD",
        1_704_067_200,
        86_400,
        &[10.0, 11.0, 12.0],
    )
    .expect("series");
    let mut source = StrategyKind::from_spec(&config.strategy);
    let result = SimulationLoop::new(&config)
        .run(&series, &[], &mut source, &NeverCancel, &mut |_| {})
        .expect("run");

    let sink = FilesystemResultSink::new(unique_tmp_dir("it_plain"));
    let job_id = JobId::new("job-plain");
    sink.persist(&job_id, &config, &result).expect("persist");
    let job_dir = sink.job_dir(&job_id);
    assert!(job_dir.join("summary.json").exists());
    assert!(!job_dir.join("config.toml").exists());
}
