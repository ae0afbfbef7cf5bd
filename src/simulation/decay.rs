//! Degradation phase - per-unit stochastic loss, boosted by interferon

use std::collections::BTreeMap;

use ahash::AHashMap;
use rand::Rng;

use crate::catalog::entity::EntityCatalog;
use crate::core::config::DEFAULT_DECAY_RATE;
use crate::core::types::EntityClass;
use crate::events::TurnLog;
use crate::simulation::application::bernoulli_successes;
use crate::simulation::feedback::FeedbackSignal;
use crate::simulation::population::PopulationVector;

/// Base rates and classes for the entities one engine can ever hold
#[derive(Debug, Clone, Default)]
pub struct DecayTable {
    base_rates: BTreeMap<String, f64>,
    classes: AHashMap<String, EntityClass>,
}

impl DecayTable {
    /// Copy what decay needs out of the catalog, so the engine never
    /// depends on the catalog staying alive or unchanged.
    pub fn new(base_rates: BTreeMap<String, f64>, catalog: Option<&dyn EntityCatalog>) -> Self {
        let classes = match catalog {
            Some(catalog) => base_rates
                .keys()
                .filter_map(|name| {
                    catalog
                        .get_entity(name)
                        .map(|kind| (name.clone(), kind.category))
                })
                .collect(),
            None => AHashMap::new(),
        };
        Self { base_rates, classes }
    }

    pub fn base_rate(&self, entity: &str) -> f64 {
        self.base_rates
            .get(entity)
            .copied()
            .unwrap_or(DEFAULT_DECAY_RATE)
    }

    /// Entities the catalog never described get no interferon bonus
    pub fn class_of(&self, entity: &str) -> Option<EntityClass> {
        self.classes.get(entity).copied()
    }

    /// Base rate scaled by the interferon bonus, capped at 1
    pub fn effective_rate(&self, entity: &str, feedback: &FeedbackSignal) -> f64 {
        let bonus = self
            .class_of(entity)
            .map(|class| feedback.decay_bonus(class))
            .unwrap_or(0.0);
        (self.base_rate(entity) * (1.0 + bonus)).min(1.0)
    }

    /// Roll one trial per unit of every entity and log the losses
    pub fn roll<R: Rng + ?Sized>(
        &self,
        population: &PopulationVector,
        feedback: &FeedbackSignal,
        rng: &mut R,
        log: &mut TurnLog,
    ) {
        for (entity, count) in population.iter() {
            let rate = self.effective_rate(entity, feedback);
            if rate <= 0.0 {
                continue;
            }
            let decayed = bernoulli_successes(count, rate, rng);
            if decayed > 0 {
                log.record_degraded(entity, decayed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::entity::EntityKind;
    use crate::core::config::FeedbackConfig;
    use crate::core::types::Location;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn table() -> DecayTable {
        let mut catalog: AHashMap<String, EntityKind> = AHashMap::new();
        catalog.insert(
            "rna".into(),
            EntityKind::new("rna", EntityClass::Rna, Location::Cytoplasm).with_decay_rate(0.1),
        );
        catalog.insert(
            "virion".into(),
            EntityKind::new("virion", EntityClass::Virion, Location::Extracellular),
        );
        let rates: BTreeMap<String, f64> = [
            ("rna".to_string(), 0.1),
            ("virion".to_string(), 0.05),
            ("stable".to_string(), 0.0),
            ("doomed".to_string(), 1.0),
        ]
        .into_iter()
        .collect();
        DecayTable::new(rates, Some(&catalog))
    }

    #[test]
    fn test_effective_rate_uses_class_bonus() {
        let table = table();
        let mut feedback = FeedbackSignal::new(FeedbackConfig::default());
        assert_eq!(table.effective_rate("rna", &feedback), 0.1);

        feedback.end_turn(80.0);
        // RNA bonus 80 * 0.0125 = 1.0, so the rate doubles
        assert_eq!(table.effective_rate("rna", &feedback), 0.2);
        assert_eq!(table.effective_rate("virion", &feedback), 0.05);
        assert_eq!(table.effective_rate("doomed", &feedback), 1.0);
        assert_eq!(table.effective_rate("unlisted", &feedback), DEFAULT_DECAY_RATE);
    }

    #[test]
    fn test_zero_rate_never_decays_and_full_rate_always_does() {
        let table = table();
        let feedback = FeedbackSignal::new(FeedbackConfig::default());
        let population: PopulationVector = [("stable".to_string(), 50), ("doomed".to_string(), 7)]
            .into_iter()
            .collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut log = TurnLog::new();
        table.roll(&population, &feedback, &mut rng, &mut log);

        let degraded = log.entities_degraded();
        assert_eq!(degraded.get("doomed"), Some(&7));
        assert!(!degraded.contains_key("stable"));
    }

    #[test]
    fn test_no_catalog_means_no_bonus() {
        let rates: BTreeMap<String, f64> = [("rna".to_string(), 0.1)].into_iter().collect();
        let table = DecayTable::new(rates, None);
        let mut feedback = FeedbackSignal::new(FeedbackConfig::default());
        feedback.end_turn(101.0);
        assert_eq!(table.class_of("rna"), None);
        assert_eq!(table.effective_rate("rna", &feedback), 0.1);
    }
}
