use crate::errors::SimulationError;
use serde::{Deserialize, Serialize};

/// One OHLCV observation. `timestamp` is epoch seconds (UTC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// Flat bar where every price equals `close`.
    pub fn flat(timestamp: i64, close: f64) -> Self {
        Self {
            timestamp,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        }
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(SimulationError::validation(format!(
                "bar at {} has non-positive or non-finite prices",
                self.timestamp
            )));
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(SimulationError::validation(format!(
                "bar at {} has invalid volume {}",
                self.timestamp, self.volume
            )));
        }
        if self.high < self.open.max(self.close).max(self.low)
            || self.low > self.open.min(self.close).min(self.high)
        {
            return Err(SimulationError::validation(format!(
                "bar at {} violates high/low bounds",
                self.timestamp
            )));
        }
        Ok(())
    }
}
