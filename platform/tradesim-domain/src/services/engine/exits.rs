use crate::value_objects::side::Side;
use crate::value_objects::trade::Trade;

pub const STOP_LOSS_REASON: &str = "stop_loss";
pub const TAKE_PROFIT_REASON: &str = "take_profit";

/// Tracks the open entry and reports when a protective exit should fire.
#[derive(Debug, Clone, Default)]
pub struct ProtectiveExits {
    stop_loss: Option<f64>,
    take_profit: Option<f64>,
    entry_quantity: f64,
    entry_cost: f64,
}

impl ProtectiveExits {
    pub fn new(stop_loss: Option<f64>, take_profit: Option<f64>) -> Self {
        Self {
            stop_loss,
            take_profit,
            entry_quantity: 0.0,
            entry_cost: 0.0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.stop_loss.is_some() || self.take_profit.is_some()
    }

    /// Volume-weighted price of the buys since the position was last flat.
    pub fn entry_price(&self) -> Option<f64> {
        if self.entry_quantity > 0.0 {
            Some(self.entry_cost / self.entry_quantity)
        } else {
            None
        }
    }

    pub fn on_trade(&mut self, trade: &Trade) {
        match trade.side {
            Side::Buy => {
                self.entry_quantity += trade.quantity;
                self.entry_cost += trade.gross_value;
            }
            Side::Sell => {
                self.entry_quantity = 0.0;
                self.entry_cost = 0.0;
            }
        }
    }

    /// Stop-loss wins when both thresholds are crossed on the same bar.
    pub fn triggered(&self, position: f64, close: f64) -> Option<&'static str> {
        if position <= 0.0 || !self.is_enabled() {
            return None;
        }
        let entry = self.entry_price()?;
        if let Some(stop_loss) = self.stop_loss {
            if close <= entry * (1.0 - stop_loss) {
                return Some(STOP_LOSS_REASON);
            }
        }
        if let Some(take_profit) = self.take_profit {
            if close >= entry * (1.0 + take_profit) {
                return Some(TAKE_PROFIT_REASON);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{ProtectiveExits, STOP_LOSS_REASON, TAKE_PROFIT_REASON};
    use crate::value_objects::side::Side;
    use crate::value_objects::trade::Trade;

    fn trade(side: Side, price: f64, quantity: f64) -> Trade {
        Trade {
            timestamp: 0,
            bar_index: 1,
            side,
            price,
            quantity,
            gross_value: price * quantity,
            fee: 0.0,
            net_cash_delta: 0.0,
            cash_after: 0.0,
            position_after: 0.0,
            portfolio_value_after: 0.0,
            reason: "test".to_string(),
        }
    }

    #[test]
    fn averages_entries_until_flat() {
        let mut exits = ProtectiveExits::new(Some(0.1), None);
        exits.on_trade(&trade(Side::Buy, 100.0, 1.0));
        exits.on_trade(&trade(Side::Buy, 120.0, 3.0));
        assert_eq!(exits.entry_price(), Some(115.0));
        exits.on_trade(&trade(Side::Sell, 130.0, 4.0));
        assert_eq!(exits.entry_price(), None);
    }

    #[test]
    fn fires_stop_loss_and_take_profit() {
        let mut exits = ProtectiveExits::new(Some(0.1), Some(0.2));
        exits.on_trade(&trade(Side::Buy, 100.0, 2.0));
        assert_eq!(exits.triggered(2.0, 95.0), None);
        assert_eq!(exits.triggered(2.0, 90.0), Some(STOP_LOSS_REASON));
        assert_eq!(exits.triggered(2.0, 120.0), Some(TAKE_PROFIT_REASON));
        assert_eq!(exits.triggered(0.0, 50.0), None);
    }

    #[test]
    fn disabled_without_thresholds() {
        let mut exits = ProtectiveExits::default();
        exits.on_trade(&trade(Side::Buy, 100.0, 2.0));
        assert_eq!(exits.triggered(2.0, 1.0), None);
    }
}
