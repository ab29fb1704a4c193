use crate::reporting::{self, SummaryMeta};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tradesim_domain::entities::job::JobId;
use tradesim_domain::entities::result::SimulationResult;
use tradesim_domain::entities::simulation_config::SimulationConfig;
use tradesim_domain::repositories::result_sink::ResultSink;

/// Writes `trades.csv`, `equity.csv`, `summary.json` under `<out_dir>/<job_id>/`,
/// plus `config.toml` when the run config text was handed over.
#[derive(Debug, Clone)]
pub struct FilesystemResultSink {
    out_dir: PathBuf,
    config_toml: Option<String>,
}

impl FilesystemResultSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            config_toml: None,
        }
    }

    pub fn with_config_toml(mut self, contents: impl Into<String>) -> Self {
        self.config_toml = Some(contents.into());
        self
    }

    pub fn job_dir(&self, job_id: &JobId) -> PathBuf {
        self.out_dir.join(job_id.as_str())
    }
}

fn write_config_snapshot_toml(path: &Path, contents: &str) -> Result<(), String> {
    let start = Instant::now();
    fs::write(path, contents)
        .map_err(|err| format!("failed to write config snapshot {}: {}", path.display(), err))?;
    metrics::histogram!("tradesim.artifacts.write_ms", "artifact" => "config_toml")
        .record(start.elapsed().as_secs_f64() * 1000.0);
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), String> {
    fs::create_dir_all(path).map_err(|err| format!("failed to create dir {}: {}", path.display(), err))
}

impl ResultSink for FilesystemResultSink {
    fn persist(
        &self,
        job_id: &JobId,
        config: &SimulationConfig,
        result: &SimulationResult,
    ) -> Result<(), String> {
        let dir = self.job_dir(job_id);
        ensure_dir(&dir)?;

        reporting::write_trades_csv(&dir.join("trades.csv"), &result.trades)?;
        reporting::write_equity_csv(&dir.join("equity.csv"), &result.equity_curve)?;

        let meta = SummaryMeta {
            job_id: job_id.to_string(),
            symbol: config.symbol.clone(),
            strategy: result.strategy.clone(),
            interval: config.interval.label().to_string(),
            start_date: config.start_date.to_string(),
            end_date: config.end_date.to_string(),
        };
        let snapshot = serde_json::to_value(config)
            .map_err(|err| format!("failed to serialize config snapshot: {err}"))?;
        reporting::write_summary_json(&dir.join("summary.json"), result, Some(&meta), Some(&snapshot))?;
        if let Some(contents) = &self.config_toml {
            write_config_snapshot_toml(&dir.join("config.toml"), contents)?;
        }

        info!(job_id = %job_id, dir = %dir.display(), "artifacts written");
        Ok(())
    }
}
