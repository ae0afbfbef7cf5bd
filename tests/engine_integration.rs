//! Integration tests for the turn engine
//!
//! These tests drive compiled blueprints end to end:
//! - Certain conversions and multi-unit rules
//! - Rules competing for the same pool within a turn
//! - Catalysts gating replication
//! - Milestones fed from real turn results

use ahash::AHashMap;

use virus_sandbox::catalog::{EntityKind, Gene, GeneDatabase, RuleFragment, RuleSpec, BASE_ENTITY_NAME};
use virus_sandbox::core::types::{EntityClass, Location};
use virus_sandbox::genome::{compile, GeneSelection};
use virus_sandbox::progress::ProgressTracker;
use virus_sandbox::rules::RuleKind;
use virus_sandbox::simulation::{Engine, EngineStatus};

fn stable(names: &[&str]) -> AHashMap<String, EntityKind> {
    names
        .iter()
        .map(|n| {
            (
                n.to_string(),
                EntityKind::new(*n, EntityClass::Complex, Location::Cytoplasm).with_decay_rate(0.0),
            )
        })
        .collect()
}

fn gene(name: &str, rule: RuleSpec) -> Gene {
    Gene::new(name).with_effect(RuleFragment::add(rule))
}

#[test]
fn test_a_to_b_converts_everything_in_one_turn() {
    let catalog = stable(&["A", "B"]);
    let genes = vec![gene(
        "Converter",
        RuleSpec::new("A to B", "per_entity", 1.0)
            .input("A", 1, true)
            .output("B", 1),
    )];
    let blueprint = compile("A", 10, &genes, Some(&catalog)).unwrap();
    let mut engine = Engine::new(&blueprint, Some(&catalog)).with_seed(2024);

    let result = engine.advance_turn();

    assert_eq!(result.population.get("B"), 10);
    assert_eq!(result.population.get("A"), 0);
    assert!(!result.population.contains("A"));
    assert_eq!(result.population.len(), 1);
}

#[test]
fn test_pair_rule_never_applies_fractionally() {
    let catalog = stable(&["A", "AA"]);
    let genes = vec![gene(
        "Pairing",
        RuleSpec::new("Pair up", "per_pair", 1.0)
            .input("A", 2, true)
            .output("AA", 1),
    )];
    let blueprint = compile("A", 5, &genes, Some(&catalog)).unwrap();
    let mut engine = Engine::new(&blueprint, Some(&catalog)).with_seed(11);

    let result = engine.advance_turn();
    assert_eq!(result.population.get("AA"), 2);
    assert_eq!(result.population.get("A"), 1);
}

/// Pair and per-entity rules currently draw trials identically; if pair
/// semantics ever change this test should change with them.
#[test]
fn test_pair_and_entity_rules_share_trial_semantics() {
    let catalog = stable(&["A", "B"]);
    let build = |rule_type: &str| {
        let genes = vec![gene(
            "Converter",
            RuleSpec::new("A to B", rule_type, 0.5)
                .input("A", 1, true)
                .output("B", 1),
        )];
        let blueprint = compile("A", 200, &genes, Some(&catalog)).unwrap();
        assert_eq!(
            blueprint.rules[0].kind,
            RuleKind::parse(rule_type).unwrap()
        );
        Engine::new(&blueprint, Some(&catalog)).with_seed(77)
    };

    let mut per_entity = build("per_entity");
    let mut per_pair = build("per_pair");
    for _ in 0..5 {
        assert_eq!(
            per_entity.advance_turn().population,
            per_pair.advance_turn().population
        );
    }
}

#[test]
fn test_earlier_rules_deplete_the_pool_for_later_ones() {
    let catalog = stable(&["A", "B", "C"]);
    let genes = vec![
        gene(
            "First",
            RuleSpec::new("A to B", "per_entity", 1.0)
                .input("A", 1, true)
                .output("B", 1),
        ),
        gene(
            "Second",
            RuleSpec::new("A to C", "per_entity", 1.0)
                .input("A", 1, true)
                .output("C", 1),
        ),
    ];
    let blueprint = compile("A", 10, &genes, Some(&catalog)).unwrap();
    let mut engine = Engine::new(&blueprint, Some(&catalog)).with_seed(4);

    let result = engine.advance_turn();
    assert_eq!(result.population.get("B"), 10);
    assert_eq!(result.population.get("C"), 0);
    assert!(result.events.events_for_rule("A to C").next().is_none());
}

#[test]
fn test_products_are_not_available_until_next_turn() {
    let catalog = stable(&["A", "B", "C"]);
    let genes = vec![
        gene(
            "First",
            RuleSpec::new("A to B", "per_entity", 1.0)
                .input("A", 1, true)
                .output("B", 1),
        ),
        gene(
            "Second",
            RuleSpec::new("B to C", "per_entity", 1.0)
                .input("B", 1, true)
                .output("C", 1),
        ),
    ];
    let blueprint = compile("A", 6, &genes, Some(&catalog)).unwrap();
    let mut engine = Engine::new(&blueprint, Some(&catalog)).with_seed(4);

    let first = engine.advance_turn();
    assert_eq!(first.population.get("B"), 6);
    assert_eq!(first.population.get("C"), 0);

    let second = engine.advance_turn();
    assert_eq!(second.population.get("C"), 6);
    assert!(!second.population.contains("B"));
}

#[test]
fn test_replication_needs_its_catalyst() {
    let mut catalog = stable(&["polymerase"]);
    catalog.insert(
        "rna".into(),
        EntityKind::new("rna", EntityClass::Rna, Location::Cytoplasm).with_decay_rate(0.1),
    );
    let genes = vec![gene(
        "Replicase",
        RuleSpec::new("Replicate", "per_pair", 0.5)
            .input("rna", 1, false)
            .input("polymerase", 1, false)
            .output("rna", 1)
            .with_feedback(1.0),
    )];
    let blueprint = compile("rna", 20, &genes, Some(&catalog)).unwrap();
    let mut engine = Engine::new(&blueprint, Some(&catalog)).with_seed(9);

    // without polymerase nothing replicates and no interferon is made
    let result = engine.advance_turn();
    assert_eq!(result.feedback_generated, 0.0);
    assert!(result.events.entities_produced().is_empty());

    for _ in 0..50 {
        let result = engine.advance_turn();
        assert!(result.feedback_level >= 0.0 && result.feedback_level <= 100.0);
    }
}

#[test]
fn test_sample_virus_runs_to_completion_deterministically() {
    let db = GeneDatabase::with_sample();
    let mut selection = GeneSelection::new();
    for name in ["Glycoprotein S1", "Membrane fusion protein", "RNA-dependent RNA polymerase"] {
        selection.add(&db, name).unwrap();
    }
    let blueprint = selection.compile(BASE_ENTITY_NAME, 10, Some(&db)).unwrap();
    assert_eq!(blueprint.rules.len(), 3);

    let prototype = Engine::new(&blueprint, Some(&db)).with_seed(31337);
    let first = prototype.clone().run(500);
    let second = prototype.clone().run(500);
    assert_eq!(first, second);
    assert!(first.turns <= 500);
    if first.status == EngineStatus::Active {
        assert_eq!(first.turns, 500);
    }
}

#[test]
fn test_milestones_follow_engine_turns() {
    let db = GeneDatabase::with_sample();
    let mut catalog: AHashMap<String, EntityKind> = db
        .entities()
        .map(|e| (e.name.clone(), e.clone()))
        .collect();
    // make the starter immortal so survival is guaranteed
    if let Some(base) = catalog.get_mut(BASE_ENTITY_NAME) {
        base.base_decay_rate = 0.0;
    }

    let blueprint = compile::<Gene>(BASE_ENTITY_NAME, 10, &[], Some(&catalog)).unwrap();
    let mut engine = Engine::new(&blueprint, Some(&catalog)).with_seed(5);
    let mut tracker = ProgressTracker::new(db.milestones().cloned());

    let mut achieved = Vec::new();
    for _ in 0..15 {
        let result = engine.advance_turn();
        achieved.extend(tracker.observe_turn(&result, &catalog));
    }
    assert_eq!(achieved, vec!["survivor_5".to_string(), "survivor_15".to_string()]);
    assert_eq!(tracker.take_run_rewards(), 100);
    assert_eq!(tracker.progress().open.len(), 1);
}
