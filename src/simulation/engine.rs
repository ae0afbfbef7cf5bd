//! Transition engine - owns one infection's population and advances it a turn at a time
//!
//! A turn runs decay, then every compiled rule in order against a working
//! copy, then the feedback update, and only then commits to the real
//! population. Nothing outside `advance_turn` mutates engine state.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::entity::EntityCatalog;
use crate::core::config::{SimulationConfig, FEEDBACK_PRECISION};
use crate::core::error::Result;
use crate::core::types::{round_to, Turn};
use crate::events::{applications_from_events, Event, TurnLog};
use crate::genome::CompiledBlueprint;
use crate::rules::TransformationRule;
use crate::simulation::application::apply_rule;
use crate::simulation::decay::DecayTable;
use crate::simulation::feedback::{FeedbackBand, FeedbackSignal};
use crate::simulation::population::PopulationVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    Active,
    Extinct,
    Victorious,
}

impl EngineStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EngineStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineStatus::Active => "active",
            EngineStatus::Extinct => "extinct",
            EngineStatus::Victorious => "victorious",
        }
    }
}

/// Everything one call to `advance_turn` produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    /// The turn just completed (1 for the first turn)
    pub turn: Turn,
    pub events: TurnLog,
    /// Interferon level after this turn's update
    pub feedback_level: f64,
    /// Interferon accrued from rules this turn, before clamping
    pub feedback_generated: f64,
    pub feedback_band: FeedbackBand,
    /// Committed population after the turn
    pub population: PopulationVector,
    pub status: EngineStatus,
}

impl TurnResult {
    pub fn entities_produced_this_turn(&self) -> std::collections::BTreeMap<String, u64> {
        self.events.entities_produced()
    }
}

/// Outcome of a whole run, as reported by `Engine::run` and batches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: u64,
    pub turns: Turn,
    pub status: EngineStatus,
    pub final_total: u64,
    pub peak_total: u64,
    pub peak_feedback: f64,
}

#[derive(Debug, Clone)]
pub struct Engine {
    config: SimulationConfig,
    rules: Vec<TransformationRule>,
    decay: DecayTable,
    population: PopulationVector,
    feedback: FeedbackSignal,
    turn: Turn,
    status: EngineStatus,
    seed: u64,
    rng: ChaCha8Rng,
}

impl Engine {
    /// Build an engine from a compiled blueprint
    ///
    /// The engine copies what it needs, so the blueprint and catalog can be
    /// dropped or reused afterwards. Seeded from entropy; use `with_seed`
    /// for reproducible runs.
    pub fn new(blueprint: &CompiledBlueprint, catalog: Option<&dyn EntityCatalog>) -> Self {
        let config = SimulationConfig::default();
        let seed = rand::random();
        let population = blueprint.starting_population.clone();
        let status = status_for(&population, config.victory_threshold);
        Self {
            feedback: FeedbackSignal::new(config.feedback.clone()),
            config,
            rules: blueprint.rules.clone(),
            decay: DecayTable::new(blueprint.decay_rates.clone(), catalog),
            population,
            turn: 0,
            status,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    /// Replace the configuration; resets the feedback signal to its minimum
    ///
    /// The configuration is validated here so a bad range is refused before
    /// any turn runs.
    pub fn with_config(mut self, config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        self.feedback = FeedbackSignal::new(config.feedback.clone());
        self.status = status_for(&self.population, config.victory_threshold);
        self.config = config;
        Ok(self)
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Turns completed so far
    pub fn turn(&self) -> Turn {
        self.turn
    }

    pub fn population(&self) -> &PopulationVector {
        &self.population
    }

    pub fn feedback_level(&self) -> f64 {
        self.feedback.level()
    }

    pub fn feedback_band(&self) -> FeedbackBand {
        self.feedback.band()
    }

    pub fn rules(&self) -> &[TransformationRule] {
        &self.rules
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Advance the simulation by one turn
    ///
    /// On a terminal engine this changes nothing and reports the last state
    /// with an empty event list.
    pub fn advance_turn(&mut self) -> TurnResult {
        if self.is_terminal() {
            tracing::warn!(
                "advance_turn called on {} engine at turn {}; ignoring",
                self.status.as_str(),
                self.turn
            );
            return self.snapshot(TurnLog::new(), 0.0);
        }

        let start = self.population.clone();
        let mut log = TurnLog::new();

        // Decay, against the turn-start population and feedback level
        self.decay
            .roll(&start, &self.feedback, &mut self.rng, &mut log);

        let mut working = start;
        for event in log.iter() {
            if let Event::Degraded { entity, count } = event {
                working.debit(entity, *count);
            }
        }

        // Rules, in compiled order against a depleting pool
        let mut accrued = 0.0;
        for rule in &self.rules {
            let first_event = log.len();
            let applications = apply_rule(rule, &mut working, &mut self.rng, &mut log);
            if applications > 0 && rule.feedback_amount > 0.0 {
                let confirmed = applications_from_events(rule, &log.events[first_event..]);
                accrued += round_to(confirmed as f64 * rule.feedback_amount, FEEDBACK_PRECISION);
            }
        }
        let feedback_generated = round_to(accrued, FEEDBACK_PRECISION);
        self.feedback.end_turn(feedback_generated);

        self.commit(&log);
        self.turn += 1;

        self.status = status_for(&self.population, self.config.victory_threshold);
        tracing::debug!(
            "Turn {}: {} events, feedback {:.2} (+{:.2}), population {}",
            self.turn,
            log.len(),
            self.feedback.level(),
            feedback_generated,
            self.population.total()
        );
        if self.is_terminal() {
            tracing::info!(
                "Engine reached {} at turn {} with {} entities",
                self.status.as_str(),
                self.turn,
                self.population.total()
            );
        }

        self.snapshot(log, feedback_generated)
    }

    /// Advance until terminal or `max_turns` more turns have run
    pub fn run(&mut self, max_turns: Turn) -> RunSummary {
        let mut peak_total = self.population.total();
        let mut peak_feedback = self.feedback.level();
        let mut remaining = max_turns;
        while remaining > 0 && !self.is_terminal() {
            let result = self.advance_turn();
            peak_total = peak_total.max(result.population.total());
            peak_feedback = peak_feedback.max(result.feedback_level);
            remaining -= 1;
        }
        RunSummary {
            seed: self.seed,
            turns: self.turn,
            status: self.status,
            final_total: self.population.total(),
            peak_total,
            peak_feedback,
        }
    }

    /// Apply degraded, then consumed, then produced deltas
    fn commit(&mut self, log: &TurnLog) {
        for event in log.iter().filter(|e| matches!(e, Event::Degraded { .. })) {
            self.population.debit(event.entity(), event.count());
        }
        for event in log.iter().filter(|e| matches!(e, Event::Consumed { .. })) {
            self.population.debit(event.entity(), event.count());
        }
        for event in log.iter().filter(|e| matches!(e, Event::Produced { .. })) {
            self.population.credit(event.entity(), event.count());
        }
        debug_assert!(self.population.iter().all(|(_, count)| count > 0));
    }

    fn snapshot(&self, events: TurnLog, feedback_generated: f64) -> TurnResult {
        TurnResult {
            turn: self.turn,
            events,
            feedback_level: self.feedback.level(),
            feedback_generated,
            feedback_band: self.feedback.band(),
            population: self.population.clone(),
            status: self.status,
        }
    }
}

fn status_for(population: &PopulationVector, victory_threshold: u64) -> EngineStatus {
    if population.is_empty() {
        EngineStatus::Extinct
    } else if population.total() >= victory_threshold {
        EngineStatus::Victorious
    } else {
        EngineStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::entity::EntityKind;
    use crate::catalog::gene::{Gene, RuleFragment, RuleSpec};
    use crate::core::error::SandboxError;
    use crate::core::types::{EntityClass, Location};
    use crate::genome::compile;
    use ahash::AHashMap;

    fn stable_catalog(names: &[&str]) -> AHashMap<String, EntityKind> {
        names
            .iter()
            .map(|n| {
                (
                    n.to_string(),
                    EntityKind::new(*n, EntityClass::Protein, Location::Cytoplasm)
                        .with_decay_rate(0.0),
                )
            })
            .collect()
    }

    fn convert_gene() -> Gene {
        Gene::new("Converter").with_effect(RuleFragment::add(
            RuleSpec::new("A to B", "per_entity", 1.0)
                .input("A", 1, true)
                .output("B", 1),
        ))
    }

    #[test]
    fn test_certain_conversion_moves_whole_population() {
        let catalog = stable_catalog(&["A", "B"]);
        let bp = compile("A", 10, &[convert_gene()], Some(&catalog)).unwrap();
        let mut engine = Engine::new(&bp, Some(&catalog)).with_seed(3);

        let result = engine.advance_turn();
        assert_eq!(result.turn, 1);
        assert_eq!(result.population.get("B"), 10);
        assert!(!result.population.contains("A"));
        assert_eq!(result.status, EngineStatus::Active);
        assert_eq!(result.entities_produced_this_turn().get("B"), Some(&10));
    }

    #[test]
    fn test_same_seed_same_history() {
        let db = crate::catalog::GeneDatabase::with_sample();
        let genes: Vec<Gene> = db.genes().cloned().collect();
        let blueprint = compile(crate::catalog::BASE_ENTITY_NAME, 10, &genes, Some(&db)).unwrap();

        let mut a = Engine::new(&blueprint, Some(&db)).with_seed(99);
        let mut b = Engine::new(&blueprint, Some(&db)).with_seed(99);
        for _ in 0..15 {
            assert_eq!(a.advance_turn(), b.advance_turn());
        }
    }

    #[test]
    fn test_extinct_engine_ignores_further_turns() {
        let mut catalog = stable_catalog(&[]);
        catalog.insert(
            "fragile".into(),
            EntityKind::new("fragile", EntityClass::Rna, Location::Cytoplasm).with_decay_rate(1.0),
        );
        let bp = compile::<Gene>("fragile", 4, &[], Some(&catalog)).unwrap();
        let mut engine = Engine::new(&bp, Some(&catalog)).with_seed(1);

        let first = engine.advance_turn();
        assert_eq!(first.status, EngineStatus::Extinct);
        assert_eq!(first.events.entities_degraded().get("fragile"), Some(&4));

        let second = engine.advance_turn();
        assert!(second.events.is_empty());
        assert_eq!(second.turn, 1);
        assert_eq!(engine.turn(), 1);
        assert_eq!(second.status, EngineStatus::Extinct);
    }

    #[test]
    fn test_victory_threshold_from_config() {
        let catalog = stable_catalog(&["A"]);
        let doubling = Gene::new("Doubler").with_effect(RuleFragment::add(
            RuleSpec::new("Double", "per_entity", 1.0)
                .input("A", 1, false)
                .output("A", 1),
        ));
        let bp = compile("A", 10, &[doubling], Some(&catalog)).unwrap();
        let config = SimulationConfig {
            victory_threshold: 50,
            ..SimulationConfig::default()
        };
        let mut engine = Engine::new(&bp, Some(&catalog))
            .with_seed(5)
            .with_config(config)
            .unwrap();

        let summary = engine.run(100);
        // 10 -> 20 -> 40 -> 80
        assert_eq!(summary.turns, 3);
        assert_eq!(summary.status, EngineStatus::Victorious);
        assert_eq!(summary.final_total, 80);
        assert_eq!(summary.peak_total, 80);
    }

    #[test]
    fn test_feedback_accrues_per_application() {
        let catalog = stable_catalog(&["A", "B"]);
        let noisy = Gene::new("Noisy").with_effect(RuleFragment::add(
            RuleSpec::new("A to B", "per_entity", 1.0)
                .input("A", 1, true)
                .output("B", 1)
                .with_feedback(0.5),
        ));
        let bp = compile("A", 10, &[noisy], Some(&catalog)).unwrap();
        let mut engine = Engine::new(&bp, Some(&catalog)).with_seed(8);

        let result = engine.advance_turn();
        assert_eq!(result.feedback_generated, 5.0);
        assert_eq!(result.feedback_level, 5.0);

        // nothing left to convert, so the level only decays
        let result = engine.advance_turn();
        assert_eq!(result.feedback_generated, 0.0);
        assert_eq!(result.feedback_level, 4.0);
    }

    #[test]
    fn test_inverted_feedback_range_is_refused() {
        let catalog = stable_catalog(&["A", "B"]);
        let bp = compile("A", 10, &[convert_gene()], Some(&catalog)).unwrap();
        let mut config = SimulationConfig::default();
        config.feedback.min = 10.0;
        config.feedback.max = 5.0;

        let refused = Engine::new(&bp, Some(&catalog)).with_config(config);
        assert!(matches!(refused, Err(SandboxError::InvalidConfig(_))));

        let mut config = SimulationConfig::default();
        config.feedback.max = f64::NAN;
        assert!(Engine::new(&bp, Some(&catalog)).with_config(config).is_err());
    }

    #[test]
    fn test_huge_output_counts_saturate_the_population() {
        let catalog = stable_catalog(&["A", "B"]);
        let burst = Gene::new("Burst").with_effect(RuleFragment::add(
            RuleSpec::new("Burst", "per_entity", 1.0)
                .input("A", 1, false)
                .output("B", 1 << 62),
        ));
        let bp = compile("A", 10, &[burst], Some(&catalog)).unwrap();
        let mut engine = Engine::new(&bp, Some(&catalog)).with_seed(2);

        let result = engine.advance_turn();
        assert_eq!(result.population.get("A"), 10);
        assert_eq!(result.population.get("B"), u64::MAX);
        assert_eq!(result.population.total(), u64::MAX);
        assert_eq!(result.status, EngineStatus::Victorious);
    }

    #[test]
    fn test_empty_start_is_already_extinct() {
        let bp = compile::<Gene>("A", 0, &[], None).unwrap();
        let engine = Engine::new(&bp, None);
        assert!(engine.is_terminal());
        assert_eq!(engine.status(), EngineStatus::Extinct);
    }
}
