pub mod executor;
pub mod exits;
pub mod simulation;
