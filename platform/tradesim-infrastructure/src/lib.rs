pub mod artifacts;
pub mod market_data;
pub mod predictions;
pub mod reporting;
mod timestamps;
