//! Genome - gene selection and compilation into engine blueprints

pub mod compiler;
pub mod selection;

pub use compiler::{compile, CompiledBlueprint};
pub use selection::GeneSelection;
