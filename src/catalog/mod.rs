//! Catalog - entity metadata, genes, and milestones supplied to the engine

pub mod database;
pub mod entity;
pub mod gene;
pub mod milestone;

pub use database::{DatabaseInfo, GeneDatabase, BASE_ENTITY_NAME};
pub use entity::{EntityCatalog, EntityKind};
pub use gene::{FragmentSource, Gene, InputSpec, Modification, OutputSpec, RuleFragment, RuleSpec};
pub use milestone::{Milestone, MilestoneKind};
