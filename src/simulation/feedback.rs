//! Interferon feedback - the bounded global signal that speeds up decay

use serde::{Deserialize, Serialize};

use crate::core::config::{FeedbackConfig, FEEDBACK_BONUS_PRECISION, FEEDBACK_PRECISION};
use crate::core::types::{round_to, EntityClass};

/// Coarse description of the current response, for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackBand {
    Quiet,
    Low,
    Medium,
    High,
}

impl FeedbackBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackBand::Quiet => "quiet",
            FeedbackBand::Low => "low",
            FeedbackBand::Medium => "medium",
            FeedbackBand::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackSignal {
    level: f64,
    config: FeedbackConfig,
}

impl FeedbackSignal {
    pub fn new(config: FeedbackConfig) -> Self {
        Self {
            level: config.min,
            config,
        }
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// Extra decay fraction for a class at the current level
    pub fn decay_bonus(&self, class: EntityClass) -> f64 {
        if self.level <= 0.0 {
            return 0.0;
        }
        round_to(
            self.level * self.config.class_multiplier(class),
            FEEDBACK_BONUS_PRECISION,
        )
    }

    /// Apply the per-turn decay, then add this turn's accrual
    ///
    /// The level stays within [min, max] regardless of accrual size.
    pub fn end_turn(&mut self, accrued: f64) -> f64 {
        self.level = (self.level - self.config.decay_per_turn).max(self.config.min);
        if accrued > 0.0 {
            self.level = (self.level + accrued).min(self.config.max);
        }
        self.level = round_to(self.level, FEEDBACK_PRECISION).clamp(self.config.min, self.config.max);
        self.level
    }

    pub fn band(&self) -> FeedbackBand {
        if self.level >= self.config.high_threshold {
            FeedbackBand::High
        } else if self.level >= self.config.medium_threshold {
            FeedbackBand::Medium
        } else if self.level >= self.config.low_threshold {
            FeedbackBand::Low
        } else {
            FeedbackBand::Quiet
        }
    }
}
