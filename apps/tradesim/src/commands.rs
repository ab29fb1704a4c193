use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tradesim_application::config::{load_config, load_config_with_source, Config};
use tradesim_application::jobs::{JobSnapshot, SimulationService};
use tradesim_application::simulation::{self, DataPorts};
use tradesim_domain::entities::job::JobStatus;
use tradesim_domain::entities::result::SimulationResult;
use tradesim_domain::entities::simulation_config::SimulationConfig;
use tradesim_domain::repositories::market_data::MarketDataProvider;
use tradesim_domain::repositories::predictions::PredictionProvider;
use tradesim_domain::repositories::result_sink::ResultSink;
use tradesim_infrastructure::artifacts::FilesystemResultSink;
use tradesim_infrastructure::market_data::CsvMarketDataProvider;
use tradesim_infrastructure::predictions::CsvPredictionProvider;

const PROGRESS_POLL: Duration = Duration::from_millis(250);

pub struct RunArgs {
    pub config_path: PathBuf,
    pub out: Option<PathBuf>,
    pub json: bool,
}

pub struct ValidateArgs {
    pub config_path: PathBuf,
}

struct Ports {
    market_data: Arc<dyn MarketDataProvider>,
    predictions: Option<Arc<dyn PredictionProvider>>,
}

fn build_ports(config: &Config) -> Ports {
    let market_data: Arc<dyn MarketDataProvider> =
        Arc::new(CsvMarketDataProvider::new(&config.data.market_data_dir));
    let predictions = config
        .data
        .predictions_path
        .as_ref()
        .map(|path| Arc::new(CsvPredictionProvider::new(path)) as Arc<dyn PredictionProvider>);
    Ports {
        market_data,
        predictions,
    }
}

pub fn run(args: RunArgs) -> Result<(), String> {
    let (config, config_toml) = load_config_with_source(&args.config_path)?;
    let sim_config = config.to_simulation_config()?;
    let ports = build_ports(&config);

    let out_dir = args.out.or_else(|| config.out_dir().map(PathBuf::from));
    let sink = out_dir.map(|dir| {
        Arc::new(FilesystemResultSink::new(dir).with_config_toml(config_toml)) as Arc<dyn ResultSink>
    });
    let service = SimulationService::with_options(
        ports.market_data,
        ports.predictions,
        sink,
        config.validation_limits(),
        config.progress_every(),
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("failed to start tokio runtime: {err}"))?;
    let snapshot = runtime.block_on(follow(&service, sim_config, !args.json))?;

    match snapshot.status {
        JobStatus::Completed => {
            let result = service
                .result(&snapshot.id)
                .ok_or_else(|| format!("job {} completed without a result", snapshot.id))?;
            if args.json {
                print_json(&snapshot, &result)
            } else {
                print_summary(&snapshot, &result);
                Ok(())
            }
        }
        JobStatus::Cancelled => Err(format!(
            "job {} cancelled at {:.1}%",
            snapshot.id, snapshot.progress
        )),
        _ => Err(format!(
            "job {} {} at {:.1}%: {}",
            snapshot.id,
            snapshot.status.as_str(),
            snapshot.progress,
            snapshot.error.as_deref().unwrap_or("unknown error")
        )),
    }
}

/// Streams progress until the job is terminal; the first Ctrl-C requests cancellation.
async fn follow(
    service: &SimulationService,
    config: SimulationConfig,
    show_progress: bool,
) -> Result<JobSnapshot, String> {
    let id = service.submit(config).map_err(|err| err.to_string())?;
    info!(job_id = %id, "job submitted");

    let wait = service.wait(&id);
    tokio::pin!(wait);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ticker = tokio::time::interval(PROGRESS_POLL);
    let mut cancel_requested = false;
    let mut last_reported = -1.0;

    loop {
        tokio::select! {
            snapshot = &mut wait => {
                return snapshot.ok_or_else(|| format!("job {id} is no longer tracked"));
            }
            signal = &mut ctrl_c, if !cancel_requested => {
                cancel_requested = true;
                if let Err(err) = signal {
                    return Err(format!("failed to listen for ctrl-c: {err}"));
                }
                if service.cancel(&id) {
                    eprintln!("cancelling job {id}...");
                }
            }
            _ = ticker.tick() => {
                if let Some(snapshot) = service.snapshot(&id) {
                    if show_progress && snapshot.progress > last_reported {
                        eprintln!(
                            "[{}] {:>5.1}% ({} / {} bars)",
                            snapshot.status.as_str(),
                            snapshot.progress,
                            snapshot.bars_processed,
                            snapshot.total_bars
                        );
                        last_reported = snapshot.progress;
                    }
                }
            }
        }
    }
}

fn print_summary(snapshot: &JobSnapshot, result: &SimulationResult) {
    let m = &result.metrics;
    let b = &result.benchmark;
    println!("job:             {}", snapshot.id);
    println!("symbol:          {} ({})", result.symbol, result.strategy);
    println!("bars processed:  {}", result.bars_processed);
    println!("trades:          {}", result.trades.len());
    println!("initial capital: {:.2}", result.initial_capital);
    println!("final value:     {:.2}", result.final_value);
    println!("total return:    {:.2}%", m.total_return_pct);
    println!("annualized:      {:.2}%", m.annualized_return_pct);
    println!("sharpe:          {:.3}", m.sharpe_ratio);
    println!("sortino:         {:.3}", m.sortino_ratio);
    println!("calmar:          {:.3}", m.calmar_ratio);
    println!(
        "max drawdown:    {:.2}% ({} bars)",
        m.max_drawdown_pct, m.max_drawdown_duration
    );
    println!("win rate:        {:.1}%", m.win_rate);
    println!("profit factor:   {:.2}", m.profit_factor);
    println!(
        "benchmark:       {:.2}% (sharpe {:.3})",
        b.return_pct, b.sharpe_ratio
    );
}

fn print_json(snapshot: &JobSnapshot, result: &SimulationResult) -> Result<(), String> {
    let report = serde_json::json!({
        "job": snapshot,
        "symbol": result.symbol,
        "strategy": result.strategy,
        "final_value": result.final_value,
        "trades": result.trades.len(),
        "metrics": result.metrics,
        "benchmark": result.benchmark,
    });
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|err| format!("failed to serialize report: {err}"))?;
    println!("{rendered}");
    Ok(())
}

pub fn validate(args: ValidateArgs) -> Result<(), String> {
    let config = load_config(&args.config_path)?;
    let sim_config = config.to_simulation_config()?;
    let ports = build_ports(&config);

    let report = simulation::validate(
        &sim_config,
        &config.validation_limits(),
        Utc::now().date_naive(),
        DataPorts {
            market_data: ports.market_data.as_ref(),
            predictions: ports.predictions.as_deref(),
        },
    )
    .map_err(|err| err.to_string())?;

    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|err| format!("failed to serialize validation report: {err}"))?;
    println!("{rendered}");
    Ok(())
}
