use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub cash: f64,
    pub position: f64,
    pub portfolio_value: f64,
}

impl AccountState {
    pub fn new(cash: f64) -> Self {
        Self {
            cash,
            position: 0.0,
            portfolio_value: cash,
        }
    }

    pub fn value_at(&self, close: f64) -> f64 {
        self.cash + self.position * close
    }

    /// Re-marks `portfolio_value` against `close`.
    pub fn mark(&mut self, close: f64) -> f64 {
        self.portfolio_value = self.value_at(close);
        self.portfolio_value
    }
}
