//! Transformation rules - validated input -> output conversions
//!
//! A `TransformationRule` is an owned, checked copy of a catalog `RuleSpec`.
//! Once built it holds only in-range values, so the engine never has to
//! second-guess probabilities or counts while simulating.

use serde::{Deserialize, Serialize};

use crate::catalog::gene::RuleSpec;
use crate::core::config::FEEDBACK_PRECISION;
use crate::core::error::{Result, SandboxError};
use crate::core::types::round_to;

/// How trials are drawn for a rule
///
/// Both kinds currently draw one Bernoulli trial per possible application.
/// They are kept apart so the catalog label survives and so pair-wise
/// trials can diverge later without a data migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    PerEntity,
    PerPair,
}

impl RuleKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "per_entity" => Some(RuleKind::PerEntity),
            "per_pair" => Some(RuleKind::PerPair),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::PerEntity => "per_entity",
            RuleKind::PerPair => "per_pair",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleInput {
    pub entity: String,
    /// Units required per application (>= 1)
    pub count: u64,
    /// Whether the units are removed when the rule fires
    pub consumed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOutput {
    pub entity: String,
    /// Units produced per application (>= 1)
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationRule {
    pub name: String,
    pub kind: RuleKind,
    pub inputs: Vec<RuleInput>,
    pub outputs: Vec<RuleOutput>,
    /// Per-application success chance in [0, 1]
    pub probability: f64,
    /// Interferon generated per successful application
    pub feedback_amount: f64,
}

impl TransformationRule {
    /// Validate a catalog rule and take an owned copy of it
    pub fn from_spec(spec: &RuleSpec) -> Result<Self> {
        let kind = RuleKind::parse(&spec.rule_type).ok_or_else(|| SandboxError::UnknownRuleType {
            rule: spec.name.clone(),
            rule_type: spec.rule_type.clone(),
        })?;

        if spec.inputs.is_empty() {
            return Err(SandboxError::EmptyRuleInputs(spec.name.clone()));
        }

        if !(0.0..=1.0).contains(&spec.probability) {
            return Err(SandboxError::ProbabilityOutOfRange {
                rule: spec.name.clone(),
                probability: spec.probability,
            });
        }

        let check_count = |entity: &str, count: i64| -> Result<u64> {
            if count < 1 {
                return Err(SandboxError::InvalidCount {
                    rule: spec.name.clone(),
                    entity: entity.to_string(),
                    count,
                });
            }
            Ok(count as u64)
        };

        let inputs = spec
            .inputs
            .iter()
            .map(|i| {
                Ok(RuleInput {
                    entity: i.entity.clone(),
                    count: check_count(&i.entity, i.count)?,
                    consumed: i.consumed,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let outputs = spec
            .outputs
            .iter()
            .map(|o| {
                Ok(RuleOutput {
                    entity: o.entity.clone(),
                    count: check_count(&o.entity, o.count)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let feedback_amount = spec.feedback_amount.unwrap_or(0.0);
        if !feedback_amount.is_finite() || feedback_amount < 0.0 {
            return Err(SandboxError::InvalidFeedbackAmount {
                rule: spec.name.clone(),
                amount: feedback_amount,
            });
        }

        Ok(Self {
            name: spec.name.clone(),
            kind,
            inputs,
            outputs,
            probability: spec.probability,
            feedback_amount: round_to(feedback_amount, FEEDBACK_PRECISION),
        })
    }

    /// Every entity this rule reads or writes
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .iter()
            .map(|i| i.entity.as_str())
            .chain(self.outputs.iter().map(|o| o.entity.as_str()))
    }

    pub fn consumed_inputs(&self) -> impl Iterator<Item = &RuleInput> {
        self.inputs.iter().filter(|i| i.consumed)
    }
}
