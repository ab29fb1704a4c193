mod commands;
mod obs;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{RunArgs, ValidateArgs};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tradesim")]
#[command(about = "Historical trading strategy simulator.", version, arg_required_else_help = true)]
#[command(
    after_help = "Examples:\n  tradesim run --config configs/sample.toml\n  tradesim run --config configs/sample.toml --out runs/ --json\n  tradesim validate --config configs/sample.toml\n"
)]
struct Cli {
    /// Log level for tradesim crates (trace|debug|info|warn|error). TRADESIM_LOG overrides.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// Expose Prometheus metrics on host:port.
    #[arg(long, global = true)]
    metrics_addr: Option<String>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Submit one simulation job and follow it to completion. Ctrl-C cancels.
    Run {
        /// Config file path (TOML). If omitted, uses env TRADESIM_CONFIG.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Artifact directory; overrides [paths].out_dir.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Print the final report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Check the config and that market data covers the requested range.
    Validate {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn resolve_config_path(config: Option<PathBuf>) -> Result<PathBuf, String> {
    config
        .or_else(|| {
            std::env::var("TRADESIM_CONFIG")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        })
        .ok_or_else(|| "--config is required (or set TRADESIM_CONFIG)".to_string())
}

fn main() {
    let cli = Cli::parse();

    let json_logs = matches!(cli.log_format, LogFormat::Json);
    if let Err(err) = obs::init_tracing(&cli.log_level, json_logs) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    if let Err(err) = obs::init_metrics(cli.metrics_addr.as_deref()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    let outcome = match cli.command {
        CliCommand::Run { config, out, json } => resolve_config_path(config)
            .and_then(|config_path| commands::run(RunArgs { config_path, out, json })),
        CliCommand::Validate { config } => resolve_config_path(config)
            .and_then(|config_path| commands::validate(ValidateArgs { config_path })),
    };

    if let Err(err) = outcome {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
