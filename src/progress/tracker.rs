//! Milestone tracking across turns and runs
//!
//! Per-run counters (turns survived, per-class peaks, per-class cumulative
//! production) reset between runs. Achievements persist: a milestone is
//! awarded once per tracker, never again in a later run.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::entity::EntityCatalog;
use crate::catalog::milestone::{Milestone, MilestoneKind};
use crate::core::types::{EntityClass, Turn};
use crate::simulation::engine::TurnResult;

/// An unachieved milestone and how close the current run is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenMilestone {
    pub id: String,
    pub name: String,
    pub current: u64,
    pub target: u64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneProgress {
    pub achieved: Vec<String>,
    pub achieved_this_run: Vec<String>,
    pub open: Vec<OpenMilestone>,
    /// Reward of every milestone ever achieved
    pub total_reward: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    milestones: Vec<Milestone>,
    achieved: BTreeSet<String>,
    achieved_this_run: BTreeSet<String>,
    /// Achieved this run but not yet paid out
    unclaimed: Vec<String>,
    turns_survived: Turn,
    peak_counts: BTreeMap<EntityClass, u64>,
    cumulative_counts: BTreeMap<EntityClass, u64>,
}

impl ProgressTracker {
    pub fn new(milestones: impl IntoIterator<Item = Milestone>) -> Self {
        Self {
            milestones: milestones.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Fold one turn into the run counters; returns ids newly achieved
    pub fn observe_turn(&mut self, result: &TurnResult, catalog: &dyn EntityCatalog) -> Vec<String> {
        self.turns_survived = self.turns_survived.max(result.turn);

        let mut present: BTreeMap<EntityClass, u64> = BTreeMap::new();
        for (entity, count) in result.population.iter() {
            if let Some(kind) = catalog.get_entity(entity) {
                let total = present.entry(kind.category).or_insert(0);
                *total = total.saturating_add(count);
            }
        }
        for (class, count) in present {
            let peak = self.peak_counts.entry(class).or_insert(0);
            *peak = (*peak).max(count);
        }

        for (entity, count) in result.entities_produced_this_turn() {
            if let Some(kind) = catalog.get_entity(&entity) {
                let total = self.cumulative_counts.entry(kind.category).or_insert(0);
                *total = total.saturating_add(count);
            }
        }

        let mut newly = Vec::new();
        for milestone in &self.milestones {
            if self.achieved.contains(&milestone.id) {
                continue;
            }
            if self.current_value(milestone) >= milestone.target {
                newly.push(milestone.id.clone());
            }
        }
        for id in &newly {
            tracing::info!("Milestone achieved: {}", id);
            self.achieved.insert(id.clone());
            self.achieved_this_run.insert(id.clone());
            self.unclaimed.push(id.clone());
        }
        newly
    }

    fn current_value(&self, milestone: &Milestone) -> u64 {
        let by_class = |counts: &BTreeMap<EntityClass, u64>| {
            milestone
                .entity_class
                .and_then(|class| counts.get(&class).copied())
                .unwrap_or(0)
        };
        match milestone.kind {
            MilestoneKind::SurviveTurns => self.turns_survived as u64,
            MilestoneKind::PeakEntityCount => by_class(&self.peak_counts),
            MilestoneKind::CumulativeEntityCount => by_class(&self.cumulative_counts),
        }
    }

    pub fn is_achieved(&self, id: &str) -> bool {
        self.achieved.contains(id)
    }

    pub fn progress(&self) -> MilestoneProgress {
        let mut achieved = Vec::new();
        let mut open = Vec::new();
        let mut total_reward = 0;

        for milestone in &self.milestones {
            if self.achieved.contains(&milestone.id) {
                achieved.push(milestone.id.clone());
                total_reward += milestone.reward_ep;
                continue;
            }
            let current = self.current_value(milestone);
            let description = match (milestone.kind, milestone.entity_class) {
                (MilestoneKind::SurviveTurns, _) => format!("{}/{} turns", current, milestone.target),
                (MilestoneKind::PeakEntityCount, Some(class)) => format!(
                    "{}/{} {} entities (peak)",
                    current,
                    milestone.target,
                    class.as_str()
                ),
                (MilestoneKind::CumulativeEntityCount, Some(class)) => format!(
                    "{}/{} {} entities (total)",
                    current,
                    milestone.target,
                    class.as_str()
                ),
                (_, None) => format!("{}/{}", current, milestone.target),
            };
            open.push(OpenMilestone {
                id: milestone.id.clone(),
                name: milestone.name.clone(),
                current,
                target: milestone.target,
                description,
            });
        }

        MilestoneProgress {
            achieved,
            achieved_this_run: self.achieved_this_run.iter().cloned().collect(),
            open,
            total_reward,
        }
    }

    /// Reward for milestones achieved this run since the last call
    pub fn take_run_rewards(&mut self) -> u32 {
        let unclaimed = std::mem::take(&mut self.unclaimed);
        self.milestones
            .iter()
            .filter(|m| unclaimed.contains(&m.id))
            .map(|m| m.reward_ep)
            .sum()
    }

    /// Start a new run; achievements are kept
    pub fn reset_run(&mut self) {
        self.achieved_this_run.clear();
        self.unclaimed.clear();
        self.turns_survived = 0;
        self.peak_counts.clear();
        self.cumulative_counts.clear();
    }

    /// Forget everything, achievements included
    pub fn reset_all(&mut self) {
        self.achieved.clear();
        self.reset_run();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::GeneDatabase;
    use crate::events::TurnLog;
    use crate::simulation::engine::EngineStatus;
    use crate::simulation::feedback::FeedbackBand;

    fn turn(n: Turn, population: &[(&str, u64)], produced: &[(&str, u64)]) -> TurnResult {
        let mut events = TurnLog::new();
        for (entity, count) in produced {
            events.record_produced("rule", entity, *count);
        }
        TurnResult {
            turn: n,
            events,
            feedback_level: 0.0,
            feedback_generated: 0.0,
            feedback_band: FeedbackBand::Quiet,
            population: population.iter().map(|(e, c)| (e.to_string(), *c)).collect(),
            status: EngineStatus::Active,
        }
    }

    #[test]
    fn test_survival_milestone_fires_once() {
        let db = GeneDatabase::with_sample();
        let mut tracker = ProgressTracker::new(db.milestones().cloned());

        for n in 1..5 {
            assert!(tracker.observe_turn(&turn(n, &[("x", 1)], &[]), &db).is_empty());
        }
        assert_eq!(
            tracker.observe_turn(&turn(5, &[("x", 1)], &[]), &db),
            vec!["survivor_5".to_string()]
        );
        assert!(tracker.observe_turn(&turn(6, &[("x", 1)], &[]), &db).is_empty());
        assert_eq!(tracker.take_run_rewards(), 25);
        assert_eq!(tracker.take_run_rewards(), 0);

        // a second run cannot earn it again
        tracker.reset_run();
        for n in 1..=5 {
            assert!(tracker.observe_turn(&turn(n, &[("x", 1)], &[]), &db).is_empty());
        }
        assert!(tracker.is_achieved("survivor_5"));
        assert_eq!(tracker.take_run_rewards(), 0);
    }

    #[test]
    fn test_peak_counts_by_class_from_population() {
        let db = GeneDatabase::with_sample();
        let mut tracker = ProgressTracker::new(db.milestones().cloned());
        let population = [
            ("viral polymerase (cytoplasm)", 4),
            ("mature viral proteins (cytoplasm)", 6),
        ];
        let newly = tracker.observe_turn(&turn(1, &population, &[]), &db);
        assert_eq!(newly, vec!["protein_peak_10".to_string()]);
    }

    #[test]
    fn test_cumulative_counts_come_from_produced_events() {
        let mut tracker = ProgressTracker::new([Milestone::cumulative(
            "rna_50",
            "RNA Flood",
            EntityClass::Rna,
            50,
            5,
        )]);
        let db = GeneDatabase::with_sample();

        tracker.observe_turn(&turn(1, &[], &[("viral RNA (cytoplasm)", 30)]), &db);
        let progress = tracker.progress();
        let open = &progress.open[0];
        assert_eq!((open.current, open.target), (30, 50));
        assert_eq!(open.description, "30/50 RNA entities (total)");

        let newly = tracker.observe_turn(&turn(2, &[], &[("viral RNA (cytoplasm)", 20)]), &db);
        assert_eq!(newly, vec!["rna_50".to_string()]);
        assert_eq!(tracker.progress().total_reward, 5);

        tracker.reset_all();
        assert!(!tracker.is_achieved("rna_50"));
        assert_eq!(tracker.progress().open[0].current, 0);
    }
}
