use crate::value_objects::side::Side;
use serde::{Deserialize, Serialize};

/// One executed order. Immutable once appended to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub timestamp: i64,
    pub bar_index: usize,
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
    pub gross_value: f64,
    pub fee: f64,
    /// Negative for buys (cost + fee), positive for sells (proceeds - fee).
    pub net_cash_delta: f64,
    pub cash_after: f64,
    pub position_after: f64,
    pub portfolio_value_after: f64,
    pub reason: String,
}
