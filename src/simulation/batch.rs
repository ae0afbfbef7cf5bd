//! Parallel batches of independent runs
//!
//! Every run is a reseeded clone of one prototype engine, so runs share no
//! mutable state and can be spread over rayon's pool freely.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::types::Turn;
use crate::simulation::engine::{Engine, EngineStatus, RunSummary};

/// Run one clone of `prototype` per seed, in parallel
///
/// Results come back in seed order.
pub fn run_batch(prototype: &Engine, seeds: &[u64], max_turns: Turn) -> Vec<RunSummary> {
    seeds
        .par_iter()
        .map(|&seed| prototype.clone().with_seed(seed).run(max_turns))
        .collect()
}

/// Aggregate outcome counts over a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub runs: usize,
    pub victories: usize,
    pub extinctions: usize,
    pub unfinished: usize,
    pub mean_turns: f64,
    pub mean_peak_total: f64,
}

impl BatchStats {
    pub fn from_summaries(summaries: &[RunSummary]) -> Self {
        if summaries.is_empty() {
            return Self::default();
        }
        let count = |status: EngineStatus| summaries.iter().filter(|s| s.status == status).count();
        let runs = summaries.len();
        Self {
            runs,
            victories: count(EngineStatus::Victorious),
            extinctions: count(EngineStatus::Extinct),
            unfinished: count(EngineStatus::Active),
            mean_turns: summaries.iter().map(|s| s.turns as f64).sum::<f64>() / runs as f64,
            mean_peak_total: summaries.iter().map(|s| s.peak_total as f64).sum::<f64>()
                / runs as f64,
        }
    }
}
