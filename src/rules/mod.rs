//! Runtime transition rules compiled from genes

pub mod transition;

pub use transition::{RuleInput, RuleKind, RuleOutput, TransformationRule};
