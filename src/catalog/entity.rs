//! Entity kinds - static metadata for countable simulation units

use serde::{Deserialize, Serialize};

use crate::core::config::DEFAULT_DECAY_RATE;
use crate::core::error::{Result, SandboxError};
use crate::core::types::{EntityClass, Location};

/// Catalog entry describing one kind of entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityKind {
    /// Unique identifier, e.g. "viral RNA (cytoplasm)"
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "entity_class", default)]
    pub category: EntityClass,
    #[serde(rename = "location", default)]
    pub compartment: Location,
    /// Per-unit chance of degrading each turn, before interferon
    #[serde(rename = "base_degradation_rate", default = "default_decay_rate")]
    pub base_decay_rate: f64,
    /// Whether a run may start from this entity
    #[serde(default)]
    pub is_starter: bool,
}

fn default_decay_rate() -> f64 {
    DEFAULT_DECAY_RATE
}

impl EntityKind {
    pub fn new(name: impl Into<String>, category: EntityClass, compartment: Location) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            category,
            compartment,
            base_decay_rate: DEFAULT_DECAY_RATE,
            is_starter: false,
        }
    }

    pub fn with_decay_rate(mut self, rate: f64) -> Self {
        self.base_decay_rate = rate;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn starter(mut self) -> Self {
        self.is_starter = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.base_decay_rate) {
            return Err(SandboxError::DecayRateOutOfRange {
                entity: self.name.clone(),
                rate: self.base_decay_rate,
            });
        }
        Ok(())
    }
}

/// Read-only lookup of entity metadata by name
pub trait EntityCatalog {
    fn get_entity(&self, name: &str) -> Option<&EntityKind>;
}

impl EntityCatalog for ahash::AHashMap<String, EntityKind> {
    fn get_entity(&self, name: &str) -> Option<&EntityKind> {
        self.get(name)
    }
}
