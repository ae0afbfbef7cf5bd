//! Simulation - the turn engine and the state it owns

pub mod application;
pub mod batch;
pub mod decay;
pub mod engine;
pub mod feedback;
pub mod population;

pub use batch::{run_batch, BatchStats};
pub use engine::{Engine, EngineStatus, RunSummary, TurnResult};
pub use feedback::{FeedbackBand, FeedbackSignal};
pub use population::PopulationVector;
