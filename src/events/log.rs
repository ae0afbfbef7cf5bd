//! Turn log - structured record of everything that changed in one turn

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rules::TransformationRule;

/// Label reported for degradation, which no compiled rule owns
pub const DEGRADATION_SOURCE: &str = "Natural degradation";

/// A single population change
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Units lost to natural (interferon-enhanced) degradation
    ///
    /// Carries no rule name; `source()` reports `DEGRADATION_SOURCE`.
    Degraded { entity: String, count: u64 },
    /// Units removed by a firing rule
    Consumed {
        rule: String,
        entity: String,
        count: u64,
    },
    /// Units created by a firing rule
    Produced {
        rule: String,
        entity: String,
        count: u64,
    },
}

impl Event {
    pub fn entity(&self) -> &str {
        match self {
            Event::Degraded { entity, .. }
            | Event::Consumed { entity, .. }
            | Event::Produced { entity, .. } => entity.as_str(),
        }
    }

    pub fn count(&self) -> u64 {
        match self {
            Event::Degraded { count, .. }
            | Event::Consumed { count, .. }
            | Event::Produced { count, .. } => *count,
        }
    }

    /// Name of the rule behind the change; `None` for degradation
    pub fn rule_name(&self) -> Option<&str> {
        match self {
            Event::Degraded { .. } => None,
            Event::Consumed { rule, .. } | Event::Produced { rule, .. } => Some(rule.as_str()),
        }
    }

    /// What caused the change: the rule name, or `DEGRADATION_SOURCE`
    pub fn source(&self) -> &str {
        self.rule_name().unwrap_or(DEGRADATION_SOURCE)
    }
}

/// All events of one turn, in the order they happened
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnLog {
    pub events: Vec<Event>,
}

impl TurnLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_degraded(&mut self, entity: &str, count: u64) {
        self.events.push(Event::Degraded {
            entity: entity.to_string(),
            count,
        });
    }

    pub fn record_consumed(&mut self, rule: &str, entity: &str, count: u64) {
        self.events.push(Event::Consumed {
            rule: rule.to_string(),
            entity: entity.to_string(),
            count,
        });
    }

    pub fn record_produced(&mut self, rule: &str, entity: &str, count: u64) {
        self.events.push(Event::Produced {
            rule: rule.to_string(),
            entity: entity.to_string(),
            count,
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn events_for_rule<'a>(&'a self, rule: &'a str) -> impl Iterator<Item = &'a Event> {
        self.events
            .iter()
            .filter(move |e| e.rule_name() == Some(rule))
    }

    /// Units produced this turn, per entity
    pub fn entities_produced(&self) -> BTreeMap<String, u64> {
        totals(self.events.iter().filter(|e| matches!(e, Event::Produced { .. })))
    }

    /// Units consumed this turn, per entity
    pub fn entities_consumed(&self) -> BTreeMap<String, u64> {
        totals(self.events.iter().filter(|e| matches!(e, Event::Consumed { .. })))
    }

    /// Units degraded this turn, per entity
    pub fn entities_degraded(&self) -> BTreeMap<String, u64> {
        totals(self.events.iter().filter(|e| matches!(e, Event::Degraded { .. })))
    }

    /// Successful applications of a rule, recovered from its logged events
    pub fn applications_for(&self, rule: &TransformationRule) -> u64 {
        let events: Vec<Event> = self.events_for_rule(&rule.name).cloned().collect();
        applications_from_events(rule, &events)
    }
}

fn totals<'a>(events: impl Iterator<Item = &'a Event>) -> BTreeMap<String, u64> {
    let mut totals = BTreeMap::new();
    for event in events {
        let total = totals.entry(event.entity().to_string()).or_insert(0u64);
        *total = total.saturating_add(event.count());
    }
    totals
}

/// How many times a rule fired, judged from the changes it logged
///
/// Consumed inputs are checked first (floor of consumed / per-application
/// count, minimum over inputs); rules that consume nothing fall back to
/// their outputs the same way.
pub fn applications_from_events(rule: &TransformationRule, events: &[Event]) -> u64 {
    let consumed = totals(events.iter().filter(|e| matches!(e, Event::Consumed { .. })));
    if !consumed.is_empty() {
        let from_inputs = rule
            .consumed_inputs()
            .map(|i| consumed.get(&i.entity).copied().unwrap_or(0) / i.count.max(1))
            .min();
        if let Some(apps) = from_inputs {
            if apps > 0 {
                return apps;
            }
        }
    }

    let produced = totals(events.iter().filter(|e| matches!(e, Event::Produced { .. })));
    if produced.is_empty() {
        return 0;
    }
    rule.outputs
        .iter()
        .map(|o| produced.get(&o.entity).copied().unwrap_or(0) / o.count.max(1))
        .min()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::gene::RuleSpec;

    fn rule(spec: RuleSpec) -> TransformationRule {
        TransformationRule::from_spec(&spec).unwrap()
    }

    #[test]
    fn test_aggregates_from_structured_records() {
        let mut log = TurnLog::new();
        log.record_degraded("rna", 2);
        log.record_consumed("Escape", "endosome", 3);
        log.record_produced("Escape", "rna", 6);
        log.record_produced("Replicate", "rna", 4);

        assert_eq!(log.entities_produced().get("rna"), Some(&10));
        assert_eq!(log.entities_consumed().get("endosome"), Some(&3));
        assert_eq!(log.entities_degraded().get("rna"), Some(&2));
        assert_eq!(log.events_for_rule("Escape").count(), 2);
        assert_eq!(log.events[0].rule_name(), None);
        assert_eq!(log.events[0].source(), DEGRADATION_SOURCE);
        assert_eq!(log.events[1].source(), "Escape");
    }

    #[test]
    fn test_applications_from_consumed_inputs() {
        let r = rule(
            RuleSpec::new("Pair", "per_pair", 1.0)
                .input("a", 2, true)
                .output("b", 1),
        );
        let mut log = TurnLog::new();
        log.record_consumed("Pair", "a", 6);
        log.record_produced("Pair", "b", 3);
        assert_eq!(log.applications_for(&r), 3);
    }

    #[test]
    fn test_applications_fall_back_to_outputs() {
        let r = rule(
            RuleSpec::new("Replicate", "per_entity", 1.0)
                .input("rna", 1, false)
                .output("rna", 2),
        );
        let mut log = TurnLog::new();
        log.record_produced("Replicate", "rna", 8);
        assert_eq!(log.applications_for(&r), 4);
        assert_eq!(applications_from_events(&r, &[]), 0);
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = Event::Produced {
            rule: "Replicate".into(),
            entity: "rna".into(),
            count: 4,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "produced");
        assert_eq!(json["count"], 4);
    }
}
