//! Gene database - JSON-backed catalog of entities, genes, and milestones
//!
//! The database is read-only from the engine's point of view. Loading
//! validates entity degradation rates and milestone definitions and makes
//! sure the base starter entity is always present.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::entity::{EntityCatalog, EntityKind};
use crate::catalog::gene::{Gene, RuleFragment, RuleSpec};
use crate::catalog::milestone::Milestone;
use crate::core::error::Result;
use crate::core::types::{EntityClass, Location};

/// Starter entity every database is guaranteed to contain
pub const BASE_ENTITY_NAME: &str = "unenveloped virion (extracellular)";

pub const DATABASE_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub created_by: String,
    pub created_date: String,
    pub last_modified: String,
}

impl Default for DatabaseInfo {
    fn default() -> Self {
        Self {
            name: "Untitled Database".into(),
            version: DATABASE_VERSION.into(),
            description: String::new(),
            created_by: "User".into(),
            created_date: String::new(),
            last_modified: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneDatabase {
    #[serde(rename = "database_info", default)]
    pub info: DatabaseInfo,
    #[serde(default)]
    entities: BTreeMap<String, EntityKind>,
    #[serde(default)]
    genes: BTreeMap<String, Gene>,
    #[serde(default)]
    milestones: BTreeMap<String, Milestone>,
}

impl GeneDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a database from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parse a database from a JSON string
    pub fn from_json_str(content: &str) -> Result<Self> {
        let mut db: GeneDatabase = serde_json::from_str(content)?;

        // Map keys are authoritative for names
        for (key, entity) in db.entities.iter_mut() {
            if entity.name.is_empty() {
                entity.name = key.clone();
            }
        }
        for (key, gene) in db.genes.iter_mut() {
            if gene.name.is_empty() {
                gene.name = key.clone();
            }
        }

        db.ensure_base_entity();
        db.validate()?;
        Ok(db)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<()> {
        for entity in self.entities.values() {
            entity.validate()?;
        }
        for milestone in self.milestones.values() {
            milestone.validate()?;
        }
        Ok(())
    }

    fn ensure_base_entity(&mut self) {
        self.entities
            .entry(BASE_ENTITY_NAME.to_string())
            .or_insert_with(base_entity);
    }

    /// Add an entity (replaces an existing entry with the same name)
    pub fn add_entity(&mut self, entity: EntityKind) {
        self.entities.insert(entity.name.clone(), entity);
    }

    /// Add a gene (replaces an existing entry with the same name)
    pub fn add_gene(&mut self, gene: Gene) {
        self.genes.insert(gene.name.clone(), gene);
    }

    pub fn add_milestone(&mut self, milestone: Milestone) {
        self.milestones.insert(milestone.id.clone(), milestone);
    }

    pub fn get_gene(&self, name: &str) -> Option<&Gene> {
        self.genes.get(name)
    }

    pub fn genes(&self) -> impl Iterator<Item = &Gene> {
        self.genes.values()
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityKind> {
        self.entities.values()
    }

    pub fn milestones(&self) -> impl Iterator<Item = &Milestone> {
        self.milestones.values()
    }

    /// Names of all entities a run may start from
    pub fn starter_entities(&self) -> Vec<&str> {
        self.entities
            .values()
            .filter(|e| e.is_starter)
            .map(|e| e.name.as_str())
            .collect()
    }

    /// Genes not yet selected whose prerequisites are all selected
    pub fn available_genes(&self, selected: &[String]) -> Vec<&Gene> {
        self.genes
            .values()
            .filter(|g| !selected.contains(&g.name))
            .filter(|g| g.requires.iter().all(|req| selected.contains(req)))
            .collect()
    }

    /// The built-in sample database
    pub fn with_sample() -> Self {
        let mut db = Self::new();
        db.info = DatabaseInfo {
            name: "Sample Virus Gene Database".into(),
            description: "Sample database with basic viral genes and milestones".into(),
            created_by: "Virus Sandbox".into(),
            ..DatabaseInfo::default()
        };

        db.add_entity(base_entity());
        db.add_entity(
            EntityKind::new("enveloped virion (extracellular)", EntityClass::Virion, Location::Extracellular)
                .with_decay_rate(0.08)
                .with_description("Viral particle with lipid envelope")
                .starter(),
        );
        db.add_entity(
            EntityKind::new("viral spore (extracellular)", EntityClass::Virion, Location::Extracellular)
                .with_decay_rate(0.02)
                .with_description("Dormant viral form with enhanced resistance")
                .starter(),
        );
        db.add_entity(
            EntityKind::new("virion in endosome (cytoplasm)", EntityClass::Virion, Location::Endosome)
                .with_decay_rate(0.03)
                .with_description("Viral particle inside cellular endosome"),
        );
        db.add_entity(
            EntityKind::new("viral polymerase (cytoplasm)", EntityClass::Protein, Location::Cytoplasm)
                .with_decay_rate(0.08)
                .with_description("Viral RNA polymerase enzyme"),
        );
        db.add_entity(
            EntityKind::new("viral RNA (cytoplasm)", EntityClass::Rna, Location::Cytoplasm)
                .with_decay_rate(0.12)
                .with_description("Viral genetic material"),
        );
        db.add_entity(
            EntityKind::new("mature viral proteins (cytoplasm)", EntityClass::Protein, Location::Cytoplasm)
                .with_decay_rate(0.06)
                .with_description("Processed viral proteins ready for assembly"),
        );

        db.add_gene(
            Gene::new("Basic Capsid")
                .with_description("Basic viral capsid protein. Provides structural integrity."),
        );
        db.add_gene(
            Gene::new("Glycoprotein S1")
                .with_cost(50)
                .with_description("Surface protein enabling receptor binding and endocytosis")
                .with_effect(RuleFragment::add(
                    RuleSpec::new("Receptor-mediated endocytosis", "per_entity", 0.3)
                        .input(BASE_ENTITY_NAME, 1, true)
                        .output("virion in endosome (cytoplasm)", 1),
                )),
        );
        db.add_gene(
            Gene::new("RNA-dependent RNA polymerase")
                .with_cost(80)
                .with_description("Enzyme enabling viral RNA replication")
                .with_effect(RuleFragment::add(
                    RuleSpec::new("RNA replication", "per_pair", 0.7)
                        .input("viral polymerase (cytoplasm)", 1, false)
                        .input("viral RNA (cytoplasm)", 1, false)
                        .output("viral RNA (cytoplasm)", 1),
                ))
                .polymerase(),
        );
        db.add_gene(
            Gene::new("Membrane fusion protein")
                .with_cost(60)
                .with_description("Protein that enables escape from endosomes")
                .requiring("Glycoprotein S1")
                .with_effect(RuleFragment::add(
                    RuleSpec::new("Endosome escape", "per_entity", 0.8)
                        .input("virion in endosome (cytoplasm)", 1, true)
                        .output("viral RNA (cytoplasm)", 2)
                        .output("viral polymerase (cytoplasm)", 1),
                )),
        );

        let mut survivor_5 = Milestone::survive("survivor_5", "Basic Survival", 5, 25);
        survivor_5.description = "Keep your virus alive for at least 5 turns".into();
        db.add_milestone(survivor_5);

        let mut survivor_15 = Milestone::survive("survivor_15", "Extended Survival", 15, 75);
        survivor_15.description = "Keep your virus alive for at least 15 turns".into();
        db.add_milestone(survivor_15);

        let mut protein_peak = Milestone::peak("protein_peak_10", "Protein Factory", EntityClass::Protein, 10, 50);
        protein_peak.description = "Have 10 protein entities present simultaneously".into();
        db.add_milestone(protein_peak);

        db
    }
}

impl EntityCatalog for GeneDatabase {
    fn get_entity(&self, name: &str) -> Option<&EntityKind> {
        self.entities.get(name)
    }
}

fn base_entity() -> EntityKind {
    EntityKind::new(BASE_ENTITY_NAME, EntityClass::Virion, Location::Extracellular)
        .with_description("Basic viral particle outside the cell")
        .starter()
}
