pub mod account_state;
pub mod bar;
pub mod equity_sample;
pub mod interval;
pub mod prediction;
pub mod price_series;
pub mod side;
pub mod signal;
pub mod trade;
