//! Rule application - how many times a rule can fire, and how many times it does

use rand::Rng;

use crate::events::TurnLog;
use crate::rules::TransformationRule;
use crate::simulation::population::PopulationVector;

/// Count successes over `trials` independent draws with chance `probability`
pub fn bernoulli_successes<R: Rng + ?Sized>(trials: u64, probability: f64, rng: &mut R) -> u64 {
    if probability <= 0.0 {
        return 0;
    }
    let mut successes = 0;
    for _ in 0..trials {
        if rng.gen::<f64>() < probability {
            successes += 1;
        }
    }
    successes
}

/// Upper bound on applications this turn given what is available
///
/// Every input must be present in at least its per-application count;
/// otherwise the rule cannot fire at all.
pub fn max_applications(rule: &TransformationRule, available: &PopulationVector) -> u64 {
    rule.inputs
        .iter()
        .map(|input| available.get(&input.entity) / input.count.max(1))
        .min()
        .unwrap_or(0)
}

/// Fire a rule against the working population
///
/// Draws one trial per possible application, logs what was consumed and
/// produced, and debits consumed inputs from `working` so later rules in
/// the same turn see the reduced supply. Outputs are not credited to
/// `working`; they only become available next turn. Counts saturate at
/// `u64::MAX` rather than overflow.
pub fn apply_rule<R: Rng + ?Sized>(
    rule: &TransformationRule,
    working: &mut PopulationVector,
    rng: &mut R,
    log: &mut TurnLog,
) -> u64 {
    let max_apps = max_applications(rule, working);
    if max_apps == 0 {
        return 0;
    }

    let applications = bernoulli_successes(max_apps, rule.probability, rng);
    if applications == 0 {
        return 0;
    }

    for input in rule.consumed_inputs() {
        log.record_consumed(&rule.name, &input.entity, input.count.saturating_mul(applications));
    }
    for output in &rule.outputs {
        log.record_produced(&rule.name, &output.entity, output.count.saturating_mul(applications));
    }
    for input in rule.consumed_inputs() {
        working.debit(&input.entity, input.count.saturating_mul(applications));
    }

    applications
}
