//! Blueprint compiler - turns selected genes into one flat rule set
//!
//! Compilation runs in two passes over the selection:
//! 1. every `AddTransition` fragment contributes an owned, validated rule,
//!    and every `EnableEntity` fragment adds its entity to the reachable set
//! 2. every `ModifyTransition` fragment adjusts the first rule of that name
//!
//! Because all additions land before any modification, a modifier gene
//! selected ahead of the gene that adds its target still applies.

use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::catalog::entity::EntityCatalog;
use crate::catalog::gene::{FragmentSource, Modification, RuleFragment};
use crate::core::config::{DEFAULT_DECAY_RATE, FEEDBACK_PRECISION};
use crate::core::error::{Result, SandboxError};
use crate::core::types::round_to;
use crate::rules::TransformationRule;
use crate::simulation::population::PopulationVector;

/// Immutable compiled output consumed by one engine instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledBlueprint {
    pub starting_population: PopulationVector,
    /// Starter plus every entity any compiled rule reads or writes
    pub reachable_entities: BTreeSet<String>,
    /// Rules in selection order
    pub rules: Vec<TransformationRule>,
    /// Base degradation rate for every reachable entity
    pub decay_rates: BTreeMap<String, f64>,
    /// Names of the genes that were compiled, in selection order
    pub gene_names: Vec<String>,
}

impl CompiledBlueprint {
    pub fn rule(&self, name: &str) -> Option<&TransformationRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn decay_rate(&self, entity: &str) -> f64 {
        self.decay_rates
            .get(entity)
            .copied()
            .unwrap_or(DEFAULT_DECAY_RATE)
    }
}

/// Compile an ordered gene selection into a blueprint
///
/// Missing catalog entries fall back to `DEFAULT_DECAY_RATE`, and a modifier
/// naming a rule nobody added is ignored. Malformed rules, modifiers, and
/// out-of-range catalog rates fail the whole compilation.
pub fn compile<G: FragmentSource>(
    starter: &str,
    starting_count: u64,
    genes: &[G],
    catalog: Option<&dyn EntityCatalog>,
) -> Result<CompiledBlueprint> {
    let mut reachable = BTreeSet::new();
    reachable.insert(starter.to_string());

    let mut rules: Vec<TransformationRule> = Vec::new();
    // First rule with a given name wins the lookup
    let mut index: AHashMap<String, usize> = AHashMap::new();

    // Pass 1: additive fragments
    for gene in genes {
        for fragment in gene.fragments() {
            match fragment {
                RuleFragment::AddTransition { rule } => {
                    let compiled = TransformationRule::from_spec(rule)?;
                    reachable.extend(compiled.entities().map(str::to_string));
                    index.entry(compiled.name.clone()).or_insert(rules.len());
                    rules.push(compiled);
                }
                RuleFragment::EnableEntity { entity } => {
                    reachable.insert(entity.clone());
                }
                RuleFragment::ModifyTransition { .. } => {}
            }
        }
    }

    // Pass 2: modifying fragments
    for gene in genes {
        for fragment in gene.fragments() {
            if let RuleFragment::ModifyTransition {
                rule_name,
                modification,
            } = fragment
            {
                validate_modification(rule_name, modification)?;
                match index.get(rule_name) {
                    Some(&idx) => apply_modification(&mut rules[idx], modification),
                    None => tracing::debug!(
                        "Gene '{}' modifies unknown rule '{}'; ignoring",
                        gene.label(),
                        rule_name
                    ),
                }
            }
        }
    }

    let mut decay_rates = BTreeMap::new();
    for entity in &reachable {
        let rate = match catalog.and_then(|c| c.get_entity(entity)) {
            Some(kind) => {
                kind.validate()?;
                kind.base_decay_rate
            }
            None => DEFAULT_DECAY_RATE,
        };
        decay_rates.insert(entity.clone(), rate);
    }

    let mut starting_population = PopulationVector::new();
    starting_population.credit(starter, starting_count);

    Ok(CompiledBlueprint {
        starting_population,
        reachable_entities: reachable,
        rules,
        decay_rates,
        gene_names: genes.iter().map(|g| g.label().to_string()).collect(),
    })
}

fn validate_modification(rule_name: &str, modification: &Modification) -> Result<()> {
    for (field, value) in [
        ("probability_multiplier", modification.probability_multiplier),
        ("interferon_multiplier", modification.feedback_multiplier),
    ] {
        if let Some(value) = value {
            if !value.is_finite() || value < 0.0 {
                return Err(SandboxError::InvalidModifier {
                    rule: rule_name.to_string(),
                    field,
                    value,
                });
            }
        }
    }
    Ok(())
}

fn apply_modification(rule: &mut TransformationRule, modification: &Modification) {
    if let Some(multiplier) = modification.probability_multiplier {
        rule.probability = (rule.probability * multiplier).min(1.0);
    }
    if let Some(multiplier) = modification.feedback_multiplier {
        if rule.feedback_amount > 0.0 {
            rule.feedback_amount = round_to(rule.feedback_amount * multiplier, FEEDBACK_PRECISION);
        }
    }
}
