//! Population vector - entity counts owned by the engine
//!
//! An entity whose count reaches zero is removed outright, so every stored
//! count is positive.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PopulationVector {
    counts: BTreeMap<String, u64>,
}

impl PopulationVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count of an entity (0 when absent)
    pub fn get(&self, entity: &str) -> u64 {
        self.counts.get(entity).copied().unwrap_or(0)
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.counts.contains_key(entity)
    }

    /// Add units of an entity, saturating at `u64::MAX`
    pub fn credit(&mut self, entity: &str, amount: u64) {
        if amount == 0 {
            return;
        }
        let count = self.counts.entry(entity.to_string()).or_insert(0);
        *count = count.saturating_add(amount);
    }

    /// Remove units of an entity, returns amount actually removed
    ///
    /// Never goes below zero; an entity that runs out is dropped.
    pub fn debit(&mut self, entity: &str, amount: u64) -> u64 {
        let Some(count) = self.counts.get_mut(entity) else {
            return 0;
        };
        let removed = amount.min(*count);
        *count -= removed;
        if *count == 0 {
            self.counts.remove(entity);
        }
        removed
    }

    /// Sum of all counts, saturating at `u64::MAX`
    pub fn total(&self) -> u64 {
        self.counts
            .values()
            .fold(0u64, |total, &count| total.saturating_add(count))
    }

    /// Number of distinct entities present
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Entities in name order with their counts
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(name, &count)| (name.as_str(), count))
    }

    pub fn as_map(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }
}

impl FromIterator<(String, u64)> for PopulationVector {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut population = Self::new();
        for (entity, count) in iter {
            population.credit(&entity, count);
        }
        population
    }
}
