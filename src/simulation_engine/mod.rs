// simulation_engine/mod.rs
pub mod grid;
pub mod movement;
pub mod simulation;
