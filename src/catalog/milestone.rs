//! Milestone definitions - run goals that award evolution points

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SandboxError};
use crate::core::types::EntityClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneKind {
    /// Stay alive for `target` turns
    SurviveTurns,
    /// Hold `target` entities of a class at the same time
    PeakEntityCount,
    /// Produce `target` entities of a class over a run
    CumulativeEntityCount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: MilestoneKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_class: Option<EntityClass>,
    pub target: u64,
    #[serde(default)]
    pub reward_ep: u32,
}

impl Milestone {
    pub fn survive(id: impl Into<String>, name: impl Into<String>, target: u64, reward_ep: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            kind: MilestoneKind::SurviveTurns,
            entity_class: None,
            target,
            reward_ep,
        }
    }

    pub fn peak(
        id: impl Into<String>,
        name: impl Into<String>,
        class: EntityClass,
        target: u64,
        reward_ep: u32,
    ) -> Self {
        Self {
            kind: MilestoneKind::PeakEntityCount,
            entity_class: Some(class),
            ..Self::survive(id, name, target, reward_ep)
        }
    }

    pub fn cumulative(
        id: impl Into<String>,
        name: impl Into<String>,
        class: EntityClass,
        target: u64,
        reward_ep: u32,
    ) -> Self {
        Self {
            kind: MilestoneKind::CumulativeEntityCount,
            entity_class: Some(class),
            ..Self::survive(id, name, target, reward_ep)
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| SandboxError::InvalidMilestone {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.is_empty()
            || !self
                .id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(invalid(
                "id must contain only letters, numbers, underscores, and hyphens",
            ));
        }
        if self.target == 0 {
            return Err(invalid("target must be a positive integer"));
        }
        if self.kind != MilestoneKind::SurviveTurns && self.entity_class.is_none() {
            return Err(invalid("entity count milestones must specify an entity_class"));
        }
        Ok(())
    }
}
