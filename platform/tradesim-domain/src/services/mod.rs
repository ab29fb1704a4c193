pub mod analyzer;
pub mod engine;
pub mod indicators;
pub mod strategy;
