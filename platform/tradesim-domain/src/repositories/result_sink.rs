use crate::entities::job::JobId;
use crate::entities::result::SimulationResult;
use crate::entities::simulation_config::SimulationConfig;

/// Notified once per completed job. Errors are reported back to the caller
/// for logging only.
pub trait ResultSink: Send + Sync {
    fn persist(
        &self,
        job_id: &JobId,
        config: &SimulationConfig,
        result: &SimulationResult,
    ) -> Result<(), String>;
}
