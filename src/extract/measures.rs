//! Measure events: note-level events aggregated per measure

use std::collections::BTreeMap;

use super::LogicalEvent;
use crate::models::{AttributeValue, Attributes, EventType};

/// Separator between note labels in a measure label
pub const LABEL_SEPARATOR: &str = "_";

/// Collapse note-level events into one event per measure.
///
/// The label joins the note labels in order, the event spans the earliest
/// onset to the latest end, and each attribute takes its most frequent value
/// (first seen wins ties). Measures without note-level events are dropped.
pub fn measure_events(events: &[LogicalEvent]) -> Vec<LogicalEvent> {
    let mut by_measure: BTreeMap<usize, Vec<&LogicalEvent>> = BTreeMap::new();
    for event in events {
        by_measure.entry(event.measure).or_default().push(event);
    }

    by_measure
        .into_iter()
        .filter_map(|(measure, members)| {
            let onset = members.iter().map(|e| e.onset).min()?;
            let end = members.iter().map(|e| e.end).max()?;
            let activity = members
                .iter()
                .map(|e| e.activity.as_str())
                .collect::<Vec<_>>()
                .join(LABEL_SEPARATOR);
            Some(LogicalEvent {
                activity,
                event_type: EventType::Measure,
                onset,
                end,
                measure,
                attributes: most_frequent_attributes(&members),
            })
        })
        .collect()
}

fn most_frequent_attributes(events: &[&LogicalEvent]) -> Attributes {
    // key → (value, count) in first-seen order
    let mut tally: Vec<(&str, Vec<(&AttributeValue, usize)>)> = Vec::new();
    for (key, value) in events.iter().flat_map(|e| e.attributes.iter()) {
        let idx = match tally.iter().position(|(k, _)| *k == key.as_str()) {
            Some(idx) => idx,
            None => {
                tally.push((key.as_str(), Vec::new()));
                tally.len() - 1
            }
        };
        let counts = &mut tally[idx].1;
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }

    tally
        .into_iter()
        .filter_map(|(key, counts)| {
            let mut best: Option<(&AttributeValue, usize)> = None;
            for (value, count) in counts {
                if best.map_or(true, |(_, top)| count > top) {
                    best = Some((value, count));
                }
            }
            best.map(|(value, _)| (key.to_string(), value.clone()))
        })
        .collect()
}
