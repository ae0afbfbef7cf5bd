//! Virus Sandbox - stochastic population engine driven by compiled genes

pub mod catalog;
pub mod core;
pub mod events;
pub mod genome;
pub mod progress;
pub mod rules;
pub mod simulation;
