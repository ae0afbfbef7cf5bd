//! Simulation configuration with documented constants
//!
//! All magic numbers are collected here with explanations of their purpose
//! and how they interact with each other.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SandboxError};
use crate::core::types::EntityClass;

/// Degradation rate used for any entity the catalog does not describe
pub const DEFAULT_DECAY_RATE: f64 = 0.05;

/// Decimal places kept for interferon amounts and levels
pub const FEEDBACK_PRECISION: i32 = 2;

/// Decimal places kept for the interferon degradation bonus
pub const FEEDBACK_BONUS_PRECISION: i32 = 4;

/// Configuration for the interferon feedback loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Lower bound of the interferon level
    pub min: f64,

    /// Upper bound of the interferon level
    ///
    /// Accrual beyond this is discarded, so a burst of replication cannot
    /// push the response arbitrarily high.
    pub max: f64,

    /// Amount the interferon level falls at the start of every feedback update
    ///
    /// At 1.0, a level of 100 with no further accrual returns to zero
    /// in 100 turns.
    pub decay_per_turn: f64,

    /// Degradation bonus per interferon level for RNA entities
    ///
    /// At 0.0125 and full interferon (100), RNA degrades at 2.25x its base rate.
    pub rna_multiplier: f64,

    /// Degradation bonus per interferon level for protein entities
    ///
    /// At 0.0075 and full interferon, proteins degrade at 1.75x base rate.
    pub protein_multiplier: f64,

    /// Degradation bonus per interferon level for DNA entities
    ///
    /// DNA is the most resistant class: 1.5x base rate at full interferon.
    pub dna_multiplier: f64,

    /// Level at or above which the response is reported as "low"
    pub low_threshold: f64,

    /// Level at or above which the response is reported as "medium"
    pub medium_threshold: f64,

    /// Level at or above which the response is reported as "high"
    pub high_threshold: f64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
            decay_per_turn: 1.0,

            // RNA > protein > DNA; virions and complexes are unaffected
            rna_multiplier: 0.0125,
            protein_multiplier: 0.0075,
            dna_multiplier: 0.005,

            low_threshold: 25.0,
            medium_threshold: 50.0,
            high_threshold: 75.0,
        }
    }
}

impl FeedbackConfig {
    /// Per-level degradation multiplier for an entity class
    pub fn class_multiplier(&self, class: EntityClass) -> f64 {
        match class {
            EntityClass::Rna => self.rna_multiplier,
            EntityClass::Protein => self.protein_multiplier,
            EntityClass::Dna => self.dna_multiplier,
            EntityClass::Virion | EntityClass::Complex | EntityClass::Unknown => 0.0,
        }
    }
}

/// Configuration for the population engine
///
/// These values have been tuned to produce a playable difficulty curve.
/// Changing them will affect how quickly runs end in extinction or victory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub feedback: FeedbackConfig,

    /// Total population at which a run is won
    ///
    /// Reaching this ends the run as Victorious on the turn it is crossed.
    pub victory_threshold: u64,

    /// Number of starter entities a fresh run begins with
    pub default_starting_count: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            feedback: FeedbackConfig::default(),
            victory_threshold: 10_000,
            default_starting_count: 10,
        }
    }
}

impl SimulationConfig {
    /// Parse a configuration from TOML; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        let fb = &self.feedback;
        if !(fb.min.is_finite() && fb.max.is_finite()) || fb.min > fb.max {
            return Err(SandboxError::InvalidConfig(format!(
                "feedback bounds [{}, {}] are not an ordered finite range",
                fb.min, fb.max
            )));
        }
        if !fb.decay_per_turn.is_finite() || fb.decay_per_turn < 0.0 {
            return Err(SandboxError::InvalidConfig(format!(
                "feedback decay_per_turn {} must be >= 0",
                fb.decay_per_turn
            )));
        }
        for (name, value) in [
            ("rna_multiplier", fb.rna_multiplier),
            ("protein_multiplier", fb.protein_multiplier),
            ("dna_multiplier", fb.dna_multiplier),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SandboxError::InvalidConfig(format!(
                    "feedback {} {} must be >= 0",
                    name, value
                )));
            }
        }
        if self.victory_threshold == 0 {
            return Err(SandboxError::InvalidConfig(
                "victory_threshold must be positive".into(),
            ));
        }
        Ok(())
    }
}
