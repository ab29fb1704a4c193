use thiserror::Error;

/// Failure taxonomy shared by the simulation core and its ports.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// Config rejected before a job starts.
    #[error("invalid simulation config: {0}")]
    Validation(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("market data unavailable: {0}")]
    DataUnavailable(String),

    /// Cooperative unwind into the `cancelled` state; not a failure.
    #[error("simulation cancelled")]
    Cancelled,

    #[error("execution failed: {0}")]
    Execution(String),
}

impl SimulationError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
