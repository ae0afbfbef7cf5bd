use thiserror::Error;

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Rule '{0}' has no inputs and can never fire")]
    EmptyRuleInputs(String),

    #[error("Rule '{rule}' has probability {probability} outside [0, 1]")]
    ProbabilityOutOfRange { rule: String, probability: f64 },

    #[error("Rule '{rule}' has count {count} for entity '{entity}' (must be >= 1)")]
    InvalidCount {
        rule: String,
        entity: String,
        count: i64,
    },

    #[error("Rule '{rule}' has unknown rule type '{rule_type}'")]
    UnknownRuleType { rule: String, rule_type: String },

    #[error("Rule '{rule}' has invalid interferon amount {amount}")]
    InvalidFeedbackAmount { rule: String, amount: f64 },

    #[error("Modification of rule '{rule}' has invalid {field} {value}")]
    InvalidModifier {
        rule: String,
        field: &'static str,
        value: f64,
    },

    #[error("Entity '{entity}' has degradation rate {rate} outside [0, 1]")]
    DecayRateOutOfRange { entity: String, rate: f64 },

    #[error("Invalid milestone '{id}': {reason}")]
    InvalidMilestone { id: String, reason: String },

    #[error("Unknown gene: {0}")]
    UnknownGene(String),

    #[error("Gene already installed: {0}")]
    GeneAlreadySelected(String),

    #[error("Gene '{gene}' is missing prerequisites: {missing:?}")]
    MissingPrerequisites { gene: String, missing: Vec<String> },

    #[error("Gene '{gene}' is a polymerase but '{installed}' is already installed")]
    PolymeraseLimit { gene: String, installed: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SandboxError>;
