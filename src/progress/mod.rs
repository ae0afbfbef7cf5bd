//! Progress - milestone tracking fed by structured turn results

pub mod tracker;

pub use tracker::{MilestoneProgress, OpenMilestone, ProgressTracker};
