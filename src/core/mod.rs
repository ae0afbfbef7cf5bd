//! Core - errors, configuration, and shared value types

pub mod config;
pub mod error;
pub mod types;

pub use config::{FeedbackConfig, SimulationConfig, DEFAULT_DECAY_RATE};
pub use error::{Result, SandboxError};
pub use types::{round_to, EntityClass, Location, Turn};
