//! Genes and the rule fragments they carry
//!
//! A gene is a modular bundle of effects. Each effect contributes a new
//! transition rule, adjusts a rule contributed by another gene, or just
//! makes an entity reachable.
//! Rules here are catalog-side descriptions; they are validated and copied
//! into owned `TransformationRule`s by the compiler.

use serde::{Deserialize, Serialize};

/// One required reagent of a catalog rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    pub entity: String,
    pub count: i64,
    #[serde(default = "default_consumed")]
    pub consumed: bool,
}

fn default_consumed() -> bool {
    true
}

/// One product of a catalog rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub entity: String,
    pub count: i64,
}

/// Unvalidated transition rule as written in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<InputSpec>,
    #[serde(default)]
    pub outputs: Vec<OutputSpec>,
    pub probability: f64,
    /// "per_entity" or "per_pair"
    #[serde(default)]
    pub rule_type: String,
    /// Interferon generated per successful application
    #[serde(rename = "interferon_amount", default, skip_serializing_if = "Option::is_none")]
    pub feedback_amount: Option<f64>,
}

impl RuleSpec {
    pub fn new(name: impl Into<String>, rule_type: impl Into<String>, probability: f64) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            probability,
            rule_type: rule_type.into(),
            feedback_amount: None,
        }
    }

    pub fn input(mut self, entity: impl Into<String>, count: i64, consumed: bool) -> Self {
        self.inputs.push(InputSpec {
            entity: entity.into(),
            count,
            consumed,
        });
        self
    }

    pub fn output(mut self, entity: impl Into<String>, count: i64) -> Self {
        self.outputs.push(OutputSpec {
            entity: entity.into(),
            count,
        });
        self
    }

    pub fn with_feedback(mut self, amount: f64) -> Self {
        self.feedback_amount = Some(amount);
        self
    }
}

/// Multipliers applied by a modify fragment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Modification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability_multiplier: Option<f64>,
    #[serde(rename = "interferon_multiplier", default, skip_serializing_if = "Option::is_none")]
    pub feedback_multiplier: Option<f64>,
}

/// A single gene effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleFragment {
    /// Contributes a new rule
    #[serde(alias = "add_production")]
    AddTransition { rule: RuleSpec },
    /// Adjusts the first previously added rule with a matching name
    ModifyTransition {
        rule_name: String,
        #[serde(default)]
        modification: Modification,
    },
    /// Marks an entity reachable without adding a rule
    EnableEntity { entity: String },
}

impl RuleFragment {
    pub fn add(rule: RuleSpec) -> Self {
        RuleFragment::AddTransition { rule }
    }

    pub fn modify(
        rule_name: impl Into<String>,
        probability_multiplier: Option<f64>,
        feedback_multiplier: Option<f64>,
    ) -> Self {
        RuleFragment::ModifyTransition {
            rule_name: rule_name.into(),
            modification: Modification {
                probability_multiplier,
                feedback_multiplier,
            },
        }
    }

    pub fn enable(entity: impl Into<String>) -> Self {
        RuleFragment::EnableEntity {
            entity: entity.into(),
        }
    }
}

/// A selectable gene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cost: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub effects: Vec<RuleFragment>,
    /// Genes that must already be selected before this one
    #[serde(default)]
    pub requires: Vec<String>,
    /// At most one polymerase gene may be selected at a time
    #[serde(default)]
    pub is_polymerase: bool,
}

impl Gene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cost: 0,
            description: String::new(),
            effects: Vec::new(),
            requires: Vec::new(),
            is_polymerase: false,
        }
    }

    pub fn with_effect(mut self, effect: RuleFragment) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn requiring(mut self, gene: impl Into<String>) -> Self {
        self.requires.push(gene.into());
        self
    }

    pub fn polymerase(mut self) -> Self {
        self.is_polymerase = true;
        self
    }
}

/// Anything that exposes an ordered list of rule fragments to the compiler
pub trait FragmentSource {
    fn label(&self) -> &str;
    fn fragments(&self) -> &[RuleFragment];
}

impl FragmentSource for Gene {
    fn label(&self) -> &str {
        &self.name
    }

    fn fragments(&self) -> &[RuleFragment] {
        &self.effects
    }
}
