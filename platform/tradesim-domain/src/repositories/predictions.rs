use crate::errors::SimulationError;
use crate::value_objects::prediction::PredictionPoint;
use chrono::NaiveDate;

/// An empty vector is a valid answer: the run simply sees no predictions.
pub trait PredictionProvider: Send + Sync {
    fn predictions(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PredictionPoint>, SimulationError>;
}
