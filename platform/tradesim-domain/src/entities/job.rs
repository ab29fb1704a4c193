use crate::entities::result::SimulationResult;
use crate::entities::simulation_config::SimulationConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal job transition {from:?} -> {to:?}")]
pub struct JobStateError {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// Lifecycle record of one simulation run.
#[derive(Debug, Clone)]
pub struct SimulationJob {
    pub id: JobId,
    pub config: SimulationConfig,
    status: JobStatus,
    progress: f64,
    bars_processed: usize,
    total_bars: usize,
    pub created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    result: Option<Arc<SimulationResult>>,
    error: Option<String>,
}

impl SimulationJob {
    pub fn new(id: JobId, config: SimulationConfig, now: DateTime<Utc>) -> Self {
        Self {
            id,
            config,
            status: JobStatus::Queued,
            progress: 0.0,
            bars_processed: 0,
            total_bars: 0,
            created_at: now,
            started_at: None,
            finished_at: None,
            result: None,
            error: None,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn bars_processed(&self) -> usize {
        self.bars_processed
    }

    pub fn total_bars(&self) -> usize {
        self.total_bars
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn result(&self) -> Option<&Arc<SimulationResult>> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn transition(&mut self, to: JobStatus) -> Result<(), JobStateError> {
        if !self.status.can_transition_to(to) {
            return Err(JobStateError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), JobStateError> {
        self.transition(JobStatus::Running)?;
        self.started_at = Some(now);
        Ok(())
    }

    /// Progress only moves forward and only while running.
    pub fn record_progress(&mut self, pct: f64, bars_processed: usize, total_bars: usize) -> bool {
        if self.status != JobStatus::Running || !pct.is_finite() {
            return false;
        }
        let pct = pct.clamp(0.0, 100.0);
        if pct < self.progress {
            return false;
        }
        self.progress = pct;
        self.bars_processed = bars_processed;
        self.total_bars = total_bars;
        true
    }

    pub fn complete(
        &mut self,
        result: Arc<SimulationResult>,
        now: DateTime<Utc>,
    ) -> Result<(), JobStateError> {
        self.transition(JobStatus::Completed)?;
        self.progress = 100.0;
        self.bars_processed = result.bars_processed;
        self.total_bars = self.total_bars.max(result.bars_processed);
        self.result = Some(result);
        self.finished_at = Some(now);
        Ok(())
    }

    pub fn fail(&mut self, error: impl Into<String>, now: DateTime<Utc>) -> Result<(), JobStateError> {
        self.transition(JobStatus::Failed)?;
        self.error = Some(error.into());
        self.finished_at = Some(now);
        Ok(())
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), JobStateError> {
        self.transition(JobStatus::Cancelled)?;
        self.finished_at = Some(now);
        Ok(())
    }
}
