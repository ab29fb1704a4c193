use crate::jobs::ServiceInner;
use crate::simulation::{run_simulation, DataPorts};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc::UnboundedSender;
use tracing::info_span;
use tradesim_domain::entities::job::JobId;
use tradesim_domain::entities::result::SimulationResult;
use tradesim_domain::entities::simulation_config::SimulationConfig;
use tradesim_domain::errors::SimulationError;
use tradesim_domain::services::engine::simulation::SimulationProgress;
use tradesim_domain::services::strategy::SignalSource;

/// Worker -> collector protocol; one terminal message ends the stream.
pub(crate) enum WorkerMessage {
    Started,
    Progress(SimulationProgress),
    Completed(Box<SimulationResult>),
    Failed(SimulationError),
    Cancelled,
}

pub(crate) fn run(
    inner: &ServiceInner,
    job_id: &JobId,
    config: SimulationConfig,
    mut source: Box<dyn SignalSource>,
    cancel: &AtomicBool,
    tx: &UnboundedSender<WorkerMessage>,
) {
    let _span = info_span!("simulation_job", job_id = %job_id).entered();
    let _ = tx.send(WorkerMessage::Started);

    if cancel.load(Ordering::Relaxed) {
        let _ = tx.send(WorkerMessage::Cancelled);
        return;
    }

    let ports = DataPorts {
        market_data: inner.market_data.as_ref(),
        predictions: inner.predictions.as_deref(),
    };
    let outcome = run_simulation(
        &config,
        ports,
        source.as_mut(),
        cancel,
        inner.progress_every,
        &mut |progress: &SimulationProgress| {
            let _ = tx.send(WorkerMessage::Progress(progress.clone()));
        },
    );

    let message = match outcome {
        Ok(result) => WorkerMessage::Completed(Box::new(result)),
        Err(SimulationError::Cancelled) => WorkerMessage::Cancelled,
        Err(err) => WorkerMessage::Failed(err),
    };
    let _ = tx.send(message);
}
