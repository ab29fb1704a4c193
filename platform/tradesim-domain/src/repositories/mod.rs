pub mod market_data;
pub mod predictions;
pub mod result_sink;
