pub mod job;
pub mod metrics;
pub mod result;
pub mod simulation_config;
