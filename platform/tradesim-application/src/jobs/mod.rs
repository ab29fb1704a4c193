mod worker;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tradesim_domain::entities::job::{JobId, JobStatus, SimulationJob};
use tradesim_domain::entities::result::SimulationResult;
use tradesim_domain::entities::simulation_config::{SimulationConfig, ValidationLimits};
use tradesim_domain::errors::SimulationError;
use tradesim_domain::repositories::market_data::MarketDataProvider;
use tradesim_domain::repositories::predictions::PredictionProvider;
use tradesim_domain::repositories::result_sink::ResultSink;
use tradesim_domain::services::strategy::{SignalSource, StrategyKind};

use worker::WorkerMessage;

/// Point-in-time view of a job, safe to hand to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub id: JobId,
    pub symbol: String,
    pub strategy: String,
    pub status: JobStatus,
    pub progress: f64,
    pub bars_processed: usize,
    pub total_bars: usize,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl From<&SimulationJob> for JobSnapshot {
    fn from(job: &SimulationJob) -> Self {
        Self {
            id: job.id.clone(),
            symbol: job.config.symbol.clone(),
            strategy: job.config.strategy.name().to_string(),
            status: job.status(),
            progress: job.progress(),
            bars_processed: job.bars_processed(),
            total_bars: job.total_bars(),
            created_at: job.created_at,
            started_at: job.started_at(),
            finished_at: job.finished_at(),
            error: job.error().map(str::to_string),
        }
    }
}

struct JobEntry {
    job: SimulationJob,
    cancel: Arc<AtomicBool>,
    status: watch::Sender<JobStatus>,
}

impl JobEntry {
    /// Terminal in the record and already published to waiters.
    fn is_settled(&self) -> bool {
        self.job.is_terminal() && self.status.borrow().is_terminal()
    }
}

pub(crate) struct ServiceInner {
    jobs: Mutex<HashMap<JobId, JobEntry>>,
    pub(crate) market_data: Arc<dyn MarketDataProvider>,
    pub(crate) predictions: Option<Arc<dyn PredictionProvider>>,
    sink: Option<Arc<dyn ResultSink>>,
    limits: ValidationLimits,
    pub(crate) progress_every: Option<usize>,
}

/// Owns every submitted job; each job runs on its own blocking worker.
#[derive(Clone)]
pub struct SimulationService {
    inner: Arc<ServiceInner>,
}

impl SimulationService {
    pub fn new(
        market_data: Arc<dyn MarketDataProvider>,
        predictions: Option<Arc<dyn PredictionProvider>>,
        sink: Option<Arc<dyn ResultSink>>,
    ) -> Self {
        Self::with_options(
            market_data,
            predictions,
            sink,
            ValidationLimits::default(),
            None,
        )
    }

    pub fn with_options(
        market_data: Arc<dyn MarketDataProvider>,
        predictions: Option<Arc<dyn PredictionProvider>>,
        sink: Option<Arc<dyn ResultSink>>,
        limits: ValidationLimits,
        progress_every: Option<usize>,
    ) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                jobs: Mutex::new(HashMap::new()),
                market_data,
                predictions,
                sink,
                limits,
                progress_every,
            }),
        }
    }

    /// Validates synchronously, then schedules the run. Needs a tokio runtime.
    pub fn submit(&self, config: SimulationConfig) -> Result<JobId, SimulationError> {
        let source = Box::new(StrategyKind::from_spec(&config.strategy));
        self.submit_with_source(config, source)
    }

    /// Like [`submit`](Self::submit) with a caller-provided signal source.
    pub fn submit_with_source(
        &self,
        config: SimulationConfig,
        source: Box<dyn SignalSource>,
    ) -> Result<JobId, SimulationError> {
        config.validate(&self.inner.limits, Utc::now().date_naive())?;
        let handle = tokio::runtime::Handle::try_current().map_err(|err| {
            SimulationError::execution(format!("job submission needs a tokio runtime: {err}"))
        })?;

        let id = JobId::new(uuid::Uuid::new_v4().to_string());
        let cancel = Arc::new(AtomicBool::new(false));
        let (status_tx, _) = watch::channel(JobStatus::Queued);
        {
            let mut jobs = self.inner.jobs.lock();
            jobs.insert(
                id.clone(),
                JobEntry {
                    job: SimulationJob::new(id.clone(), config.clone(), Utc::now()),
                    cancel: cancel.clone(),
                    status: status_tx,
                },
            );
        }
        metrics::counter!("tradesim.jobs.submitted").increment(1);
        info!(job_id = %id, symbol = %config.symbol, strategy = config.strategy.name(), "job queued");

        let (tx, rx) = mpsc::unbounded_channel();
        handle.spawn(collect(self.inner.clone(), id.clone(), rx));

        let inner = self.inner.clone();
        let job_id = id.clone();
        handle.spawn_blocking(move || worker::run(&inner, &job_id, config, source, &cancel, &tx));

        Ok(id)
    }

    pub fn snapshot(&self, id: &JobId) -> Option<JobSnapshot> {
        let jobs = self.inner.jobs.lock();
        jobs.get(id).map(|entry| JobSnapshot::from(&entry.job))
    }

    pub fn list(&self) -> Vec<JobSnapshot> {
        let jobs = self.inner.jobs.lock();
        let mut out: Vec<JobSnapshot> = jobs.values().map(|e| JobSnapshot::from(&e.job)).collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        out
    }

    /// Requests cooperative cancellation. `false` for unknown or finished jobs.
    pub fn cancel(&self, id: &JobId) -> bool {
        let jobs = self.inner.jobs.lock();
        match jobs.get(id) {
            Some(entry) if !entry.job.is_terminal() => {
                entry.cancel.store(true, Ordering::Relaxed);
                info!(job_id = %id, status = entry.job.status().as_str(), "cancellation requested");
                true
            }
            _ => false,
        }
    }

    pub fn result(&self, id: &JobId) -> Option<Arc<SimulationResult>> {
        let jobs = self.inner.jobs.lock();
        jobs.get(id).and_then(|entry| entry.job.result().cloned())
    }

    /// Drops a finished job. Active jobs, including completed ones whose sink
    /// notification is still pending, stay tracked and yield `None`.
    pub fn remove(&self, id: &JobId) -> Option<JobSnapshot> {
        let mut jobs = self.inner.jobs.lock();
        if !jobs.get(id).is_some_and(JobEntry::is_settled) {
            return None;
        }
        let entry = jobs.remove(id)?;
        info!(job_id = %id, status = entry.job.status().as_str(), "job removed");
        Some(JobSnapshot::from(&entry.job))
    }

    /// Keeps the `keep` most recently finished jobs and drops older finished ones.
    /// Returns how many were dropped.
    pub fn prune_finished(&self, keep: usize) -> usize {
        let mut jobs = self.inner.jobs.lock();
        let mut settled: Vec<(Option<DateTime<Utc>>, JobId)> = jobs
            .iter()
            .filter(|(_, entry)| entry.is_settled())
            .map(|(id, entry)| (entry.job.finished_at(), id.clone()))
            .collect();
        if settled.len() <= keep {
            return 0;
        }
        settled.sort();
        let evict = settled.len() - keep;
        for (_, id) in settled.into_iter().take(evict) {
            jobs.remove(&id);
        }
        info!(evicted = evict, kept = keep, "finished jobs pruned");
        evict
    }

    /// Resolves once the job is terminal and its result sink, if any, was notified.
    pub async fn wait(&self, id: &JobId) -> Option<JobSnapshot> {
        let mut status_rx = {
            let jobs = self.inner.jobs.lock();
            jobs.get(id)?.status.subscribe()
        };
        if status_rx.wait_for(|status| status.is_terminal()).await.is_err() {
            warn!(job_id = %id, "job status channel closed before completion");
        }
        self.snapshot(id)
    }
}

/// Applies worker messages to the job record, in order.
async fn collect(
    inner: Arc<ServiceInner>,
    id: JobId,
    mut rx: mpsc::UnboundedReceiver<WorkerMessage>,
) {
    while let Some(message) = rx.recv().await {
        let persisted = match apply(&inner, &id, message) {
            Some(Applied::Terminal(status)) => {
                publish(&inner, &id, status);
                break;
            }
            Some(Applied::Completed(config, result)) => (config, result),
            Some(Applied::Running) => {
                publish(&inner, &id, JobStatus::Running);
                continue;
            }
            None => continue,
        };

        let (config, result) = persisted;
        if let Some(sink) = inner.sink.clone() {
            let job_id = id.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                sink.persist(&job_id, &config, &result)
            })
            .await;
            match outcome {
                Ok(Ok(())) => info!(job_id = %id, "result persisted"),
                Ok(Err(err)) => warn!(job_id = %id, error = %err, "result sink failed"),
                Err(err) => warn!(job_id = %id, error = %err, "result sink task panicked"),
            }
        }
        publish(&inner, &id, JobStatus::Completed);
        break;
    }

    // Worker gone without a terminal message: record the job as failed.
    let mut jobs = inner.jobs.lock();
    if let Some(entry) = jobs.get_mut(&id) {
        if !entry.job.is_terminal() {
            let now = Utc::now();
            if entry.job.status() == JobStatus::Queued {
                let _ = entry.job.start(now);
            }
            if entry.job.fail("simulation worker exited unexpectedly", now).is_ok() {
                metrics::counter!("tradesim.jobs.failed").increment(1);
                warn!(job_id = %id, "simulation worker exited unexpectedly");
            }
            entry.status.send_replace(entry.job.status());
        }
    }
}

enum Applied {
    Running,
    Completed(SimulationConfig, Arc<SimulationResult>),
    Terminal(JobStatus),
}

fn apply(inner: &ServiceInner, id: &JobId, message: WorkerMessage) -> Option<Applied> {
    let mut jobs = inner.jobs.lock();
    let entry = jobs.get_mut(id)?;
    let job = &mut entry.job;
    let now = Utc::now();

    let outcome = match message {
        WorkerMessage::Started => job.start(now).map(|_| {
            info!(job_id = %id, "job running");
            Some(Applied::Running)
        }),
        WorkerMessage::Progress(progress) => {
            job.record_progress(progress.pct, progress.bar_index, progress.total_bars);
            Ok(None)
        }
        WorkerMessage::Completed(result) => {
            let result = Arc::new(*result);
            job.complete(result.clone(), now).map(|_| {
                metrics::counter!("tradesim.jobs.completed").increment(1);
                info!(job_id = %id, final_value = result.final_value, "job completed");
                Some(Applied::Completed(job.config.clone(), result))
            })
        }
        WorkerMessage::Failed(error) => job.fail(error.to_string(), now).map(|_| {
            metrics::counter!("tradesim.jobs.failed").increment(1);
            warn!(job_id = %id, error = %error, progress = job.progress(), "job failed");
            Some(Applied::Terminal(JobStatus::Failed))
        }),
        WorkerMessage::Cancelled => job.cancel(now).map(|_| {
            metrics::counter!("tradesim.jobs.cancelled").increment(1);
            info!(job_id = %id, progress = job.progress(), "job cancelled");
            Some(Applied::Terminal(JobStatus::Cancelled))
        }),
    };

    match outcome {
        Ok(applied) => applied,
        Err(err) => {
            warn!(job_id = %id, error = %err, "ignoring worker message");
            None
        }
    }
}

fn publish(inner: &ServiceInner, id: &JobId, status: JobStatus) {
    let jobs = inner.jobs.lock();
    if let Some(entry) = jobs.get(id) {
        entry.status.send_replace(status);
    }
}
