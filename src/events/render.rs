//! Human-readable turn report
//!
//! A one-way projection of `TurnResult`; nothing in the crate parses it back.

use crate::catalog::entity::EntityCatalog;
use crate::core::types::Location;
use crate::events::log::{applications_from_events, Event, DEGRADATION_SOURCE};
use crate::rules::TransformationRule;
use crate::simulation::engine::TurnResult;

const RULE_WIDTH: usize = 70;
const LONG_NAME: usize = 45;

/// Render one turn as console lines
pub fn render_turn(
    result: &TurnResult,
    rules: &[TransformationRule],
    catalog: Option<&dyn EntityCatalog>,
) -> Vec<String> {
    let mut lines = Vec::new();

    if result.turn == 1 {
        lines.push("=".repeat(RULE_WIDTH));
        lines.push("  SIMULATION START".to_string());
        lines.push("=".repeat(RULE_WIDTH));
    } else {
        lines.push(String::new());
        lines.push("-".repeat(RULE_WIDTH));
    }
    lines.push(format!("  TURN {}", result.turn));
    lines.push("-".repeat(RULE_WIDTH));

    lines.push(String::new());
    lines.push("  Events this turn:".to_string());
    let groups = render_events(result, rules, &mut lines);
    if groups == 0 {
        lines.push("    No events occurred this turn".to_string());
    }

    lines.push(String::new());
    lines.push("  Population at end:".to_string());
    if result.population.is_empty() {
        lines.push("    *** No entities remaining - EXTINCTION ***".to_string());
    } else {
        render_population(result, catalog, &mut lines);
        lines.push(String::new());
        lines.push(format!("    Total entities: {}", result.population.total()));
    }

    lines.push(String::new());
    lines.push(format!(
        "  Interferon activity is at {:.1}/100 ({})",
        result.feedback_level,
        result.feedback_band.as_str()
    ));
    lines
}

/// Appends event groups, returns how many were written
fn render_events(
    result: &TurnResult,
    rules: &[TransformationRule],
    lines: &mut Vec<String>,
) -> usize {
    let mut group = 0;

    let degraded: Vec<String> = result
        .events
        .iter()
        .filter(|e| matches!(e, Event::Degraded { .. }))
        .map(|e| format!("{} {}", e.count(), short_name(e.entity())))
        .collect();
    if !degraded.is_empty() {
        group += 1;
        lines.push(String::new());
        lines.push(format!("    [{}] {}", group, DEGRADATION_SOURCE));
        if result.feedback_level > 0.0 {
            lines.push(format!(
                "        (Enhanced by interferon: {:.1}/100)",
                result.feedback_level
            ));
        }
        push_items(lines, "Degraded", "-", &degraded, Some("degraded"));
    }

    // Rule groups in the order their first event appeared
    let mut seen: Vec<&str> = Vec::new();
    for event in result.events.iter() {
        if let Some(rule) = event.rule_name() {
            if !seen.contains(&rule) {
                seen.push(rule);
            }
        }
    }

    for rule_name in seen {
        let events: Vec<Event> = result.events.events_for_rule(rule_name).cloned().collect();
        let items = |consumed: bool| -> Vec<String> {
            events
                .iter()
                .filter(|e| matches!(e, Event::Consumed { .. }) == consumed)
                .map(|e| format!("{} {}", e.count(), short_name(e.entity())))
                .collect()
        };

        group += 1;
        lines.push(String::new());
        lines.push(format!("    [{}] {}", group, rule_name));
        push_items(lines, "Consumed", "-", &items(true), None);
        push_items(lines, "Produced", "+", &items(false), None);

        if let Some(rule) = rules.iter().find(|r| r.name == rule_name) {
            if rule.feedback_amount > 0.0 {
                let generated = applications_from_events(rule, &events) as f64 * rule.feedback_amount;
                if generated > 0.0 {
                    lines.push(format!("        Interferon generated: +{:.1}", generated));
                }
            }
        }
    }

    group
}

/// One item goes inline, several go on their own bullet lines
fn push_items(
    lines: &mut Vec<String>,
    heading: &str,
    bullet: &str,
    items: &[String],
    inline_suffix: Option<&str>,
) {
    match items {
        [] => {}
        [only] => match inline_suffix {
            Some(suffix) => lines.push(format!("        {} {} {}", bullet, only, suffix)),
            None => lines.push(format!("        {}: {}", heading, only)),
        },
        many => {
            lines.push(format!("        {}:", heading));
            for item in many {
                lines.push(format!("          {} {}", bullet, item));
            }
        }
    }
}

fn render_population(
    result: &TurnResult,
    catalog: Option<&dyn EntityCatalog>,
    lines: &mut Vec<String>,
) {
    let location_of = |entity: &str| -> Location {
        catalog
            .and_then(|c| c.get_entity(entity))
            .map(|kind| kind.compartment)
            .unwrap_or(Location::Unknown)
    };

    let order = Location::DISPLAY_ORDER
        .iter()
        .copied()
        .chain(std::iter::once(Location::Unknown));
    for location in order {
        let mut entries: Vec<(&str, u64)> = result
            .population
            .iter()
            .filter(|(name, _)| location_of(*name) == location)
            .collect();
        if entries.is_empty() {
            continue;
        }
        entries.sort_by_key(|(name, _)| name.to_lowercase());

        lines.push(format!("    [{}]", location.label()));
        for (name, count) in entries {
            lines.push(format!("      {:3}x {}", count, short_name(name)));
        }
    }
}

/// Abbreviate the compartment suffix of very long entity names
pub fn short_name(name: &str) -> String {
    if name.len() <= LONG_NAME {
        return name.to_string();
    }
    for (long, short) in [
        ("(extracellular)", "(ext)"),
        ("(cytoplasm)", "(cyto)"),
        ("(endosome)", "(endo)"),
        ("(nucleus)", "(nuc)"),
    ] {
        if name.contains(long) {
            return name.replace(long, short);
        }
    }
    name.to_string()
}
