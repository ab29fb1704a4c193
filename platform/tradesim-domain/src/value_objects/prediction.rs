use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Hold,
}

/// Output of the external prediction provider for one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPoint {
    pub timestamp: i64,
    pub predicted_price: f64,
    /// In `[0, 1]`.
    pub confidence: f64,
    pub direction: Direction,
}
