//! Event extraction: expanded score → event log
//!
//! # Architecture
//!
//! ```text
//! Score (performance order)
//!   ↓ [part selection + labels]
//! cases (one per piece, or one per part)
//!   ↓ [granularity handler: notes | measures | intervals | harmony]
//! logical events (label, onset, end, attributes)
//!   ↓ [lifecycle expansion + stable sort + order index]
//! EventLog
//! ```

pub mod harmony;
pub mod measures;
pub mod notes;

use std::collections::HashMap;

use crate::analysis::TempoMap;
use crate::config::{Config, Granularity};
use crate::models::{
    AttributeValue, Attributes, Event, EventLog, EventType, Lifecycle, Part, QuarterLength, Score,
    TimedElement, Trace,
};

/// An extracted event before lifecycle expansion
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalEvent {
    pub activity: String,
    pub event_type: EventType,
    pub onset: QuarterLength,
    pub end: QuarterLength,
    /// 1-based position of the measure in performance order
    pub measure: usize,
    pub attributes: Attributes,
}

impl LogicalEvent {
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// A part together with the label its events carry
#[derive(Debug, Clone, Copy)]
pub struct PartView<'a> {
    pub part: &'a Part,
    pub label: &'a str,
}

/// Label every part with its name and a counter of parts sharing that name
/// (`Piano 1`, `Piano 2`, `Violin 1`); unnamed parts count as `Part`.
pub fn part_labels(parts: &[Part]) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    parts
        .iter()
        .map(|part| {
            let name = match part.name.trim() {
                "" => "Part",
                name => name,
            };
            let count = seen.entry(name).or_insert(0);
            *count += 1;
            format!("{} {}", name, count)
        })
        .collect()
}

/// Build the event log of an expanded score
pub fn extract(score: &Score, config: &Config) -> EventLog {
    let labels = part_labels(&score.parts);
    let mut views: Vec<PartView> = score
        .parts
        .iter()
        .zip(&labels)
        .map(|(part, label)| PartView { part, label })
        .collect();
    if config.lead_part_only {
        views.truncate(1);
    }

    let tempo = TempoMap::from_score(score);

    let cases: Vec<(String, Attributes, Vec<PartView>)> = if config.multi_case {
        views
            .iter()
            .map(|view| {
                let mut attributes: Attributes = vec![("Part".to_string(), view.label.into())];
                if let Some(instrument) = &view.part.instrument {
                    attributes.push(("Instrument".to_string(), instrument.as_str().into()));
                }
                (format!("{} - {}", score.name, view.label), attributes, vec![*view])
            })
            .collect()
    } else {
        vec![(score.name.clone(), Vec::new(), views)]
    };

    let traces: Vec<Trace> = cases
        .into_iter()
        .map(|(case_id, attributes, views)| {
            let events = case_events(&views, config);
            log::debug!("{}: {} logical event(s)", case_id, events.len());
            assemble_trace(case_id, attributes, events, &config.lifecycles, &tempo)
        })
        .collect();

    let mut attributes = Attributes::new();
    if let Some(title) = &score.title {
        attributes.push(("title".to_string(), title.as_str().into()));
    }
    if let Some(composer) = &score.composer {
        attributes.push(("composer".to_string(), composer.as_str().into()));
    }

    EventLog {
        name: score.name.clone(),
        attributes,
        traces,
        lifecycle_count: config.lifecycles.len(),
    }
}

/// Logical events of one case, ordered by onset
fn case_events(views: &[PartView], config: &Config) -> Vec<LogicalEvent> {
    let mut events: Vec<LogicalEvent> = match config.granularity {
        Granularity::Note => views
            .iter()
            .flat_map(|view| notes::note_events(view, config))
            .collect(),
        Granularity::Measure => views
            .iter()
            .flat_map(|view| measures::measure_events(&notes::note_events(view, config)))
            .collect(),
        Granularity::Interval => views
            .iter()
            .flat_map(|view| notes::interval_events(view, config))
            .collect(),
        Granularity::HarmonyShift => harmony::harmony_events(views),
    };
    events.sort_by(|a, b| a.onset.cmp(&b.onset));
    events
}

/// Expand each logical event into one event per lifecycle phase, order them by
/// the time of their phase and number them from zero
pub fn assemble_trace(
    case_id: String,
    attributes: Attributes,
    logical: Vec<LogicalEvent>,
    lifecycles: &[Lifecycle],
    tempo: &TempoMap,
) -> Trace {
    let base_event_count = logical.len();
    let mut timed: Vec<(QuarterLength, Event)> = Vec::with_capacity(base_event_count * lifecycles.len());

    for event in logical {
        for &lifecycle in lifecycles {
            let at = match lifecycle {
                Lifecycle::Start => event.onset,
                Lifecycle::Complete => event.end,
            };
            timed.push((
                at,
                Event {
                    activity: event.activity.clone(),
                    event_type: event.event_type,
                    lifecycle,
                    timestamp: tempo.timestamp(at),
                    order_index: 0,
                    measure: event.measure,
                    attributes: event.attributes.clone(),
                },
            ));
        }
    }

    // Stable: a start stays ahead of its own complete at equal offsets
    timed.sort_by(|a, b| a.0.cmp(&b.0));
    let events = timed
        .into_iter()
        .enumerate()
        .map(|(order_index, (_, event))| Event { order_index, ..event })
        .collect();

    Trace {
        case_id,
        attributes,
        events,
        base_event_count,
    }
}

/// Notation context of `element` as event attributes
pub fn context_attributes(element: &TimedElement, view: &PartView) -> Attributes {
    let context = &element.context;
    let mut attributes = Attributes::new();
    if let Some(clef) = &context.clef {
        attributes.push(("Clef".to_string(), clef.name().into()));
    }
    let instrument = view.part.instrument.as_deref().unwrap_or(&view.part.name);
    if !instrument.is_empty() {
        attributes.push(("Instrument".to_string(), instrument.into()));
    }
    if let Some(key_signature) = &context.key_signature {
        attributes.push(("KeySignature".to_string(), key_signature.describe().into()));
    }
    if let Some(time_signature) = &context.time_signature {
        attributes.push((
            "TimeSignature".to_string(),
            format!("{}/{}", time_signature.beats, time_signature.beat_type).into(),
        ));
    }
    if let Some(tempo) = context.tempo {
        attributes.push(("TempoIndication".to_string(), format!("{} bpm", tempo).into()));
    }
    attributes.push(("Part".to_string(), AttributeValue::from(view.label)));
    attributes
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
