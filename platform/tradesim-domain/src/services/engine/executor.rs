use crate::entities::simulation_config::SimulationConfig;
use crate::errors::SimulationError;
use crate::value_objects::account_state::AccountState;
use crate::value_objects::bar::PriceBar;
use crate::value_objects::side::Side;
use crate::value_objects::trade::Trade;

/// Share of cash a single buy may spend; the rest absorbs fees.
pub const CASH_BUFFER: f64 = 0.95;

/// Decides whether an order is feasible and prices it at the bar close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeExecutor {
    fee_rate: f64,
    max_position_fraction: f64,
}

impl TradeExecutor {
    pub fn new(fee_rate: f64, max_position_fraction: f64) -> Self {
        Self {
            fee_rate,
            max_position_fraction,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.trading_fee_rate, config.max_position_fraction)
    }

    /// `Ok(None)` means the order is infeasible and should be treated as a hold.
    pub fn execute(
        &self,
        side: Side,
        bar: &PriceBar,
        bar_index: usize,
        account: &AccountState,
        reason: &str,
    ) -> Result<Option<Trade>, SimulationError> {
        let price = bar.close;
        if !price.is_finite() || price <= 0.0 {
            return Err(SimulationError::execution(format!(
                "cannot execute {} at {}: invalid price {price}",
                side.as_str(),
                bar.timestamp
            )));
        }
        if !account.cash.is_finite() || !account.position.is_finite() {
            return Err(SimulationError::execution(format!(
                "account state is not finite at {} (cash={}, position={})",
                bar.timestamp, account.cash, account.position
            )));
        }

        match side {
            Side::Buy => Ok(self.buy(price, bar.timestamp, bar_index, account, reason)),
            Side::Sell => Ok(self.sell(price, bar.timestamp, bar_index, account, reason)),
        }
    }

    fn buy(
        &self,
        price: f64,
        timestamp: i64,
        bar_index: usize,
        account: &AccountState,
        reason: &str,
    ) -> Option<Trade> {
        let max_buy_value = account.portfolio_value * self.max_position_fraction;
        let spendable = max_buy_value.min(account.cash * CASH_BUFFER);
        if spendable < price {
            return None;
        }

        let mut quantity = (spendable / price).floor();
        if quantity * price * (1.0 + self.fee_rate) > account.cash {
            // Fees above the buffer: shrink to what cash can actually cover.
            quantity = (account.cash / (price * (1.0 + self.fee_rate))).floor();
        }
        if quantity < 1.0 {
            return None;
        }

        let gross_value = quantity * price;
        let fee = gross_value * self.fee_rate;
        let net_cash_delta = -(gross_value + fee);
        let cash_after = (account.cash + net_cash_delta).max(0.0);
        let position_after = account.position + quantity;

        Some(Trade {
            timestamp,
            bar_index,
            side: Side::Buy,
            price,
            quantity,
            gross_value,
            fee,
            net_cash_delta,
            cash_after,
            position_after,
            portfolio_value_after: cash_after + position_after * price,
            reason: reason.to_string(),
        })
    }

    fn sell(
        &self,
        price: f64,
        timestamp: i64,
        bar_index: usize,
        account: &AccountState,
        reason: &str,
    ) -> Option<Trade> {
        if account.position <= 0.0 {
            return None;
        }

        let quantity = account.position;
        let gross_value = quantity * price;
        let fee = gross_value * self.fee_rate;
        let net_cash_delta = gross_value - fee;
        let cash_after = account.cash + net_cash_delta;

        Some(Trade {
            timestamp,
            bar_index,
            side: Side::Sell,
            price,
            quantity,
            gross_value,
            fee,
            net_cash_delta,
            cash_after,
            position_after: 0.0,
            portfolio_value_after: cash_after,
            reason: reason.to_string(),
        })
    }
}
