//! Note-level and interval events

use super::{context_attributes, LogicalEvent, PartView};
use crate::config::Config;
use crate::models::{ElementKind, EventType, Pitch, QuarterLength, TimedElement};

/// Activity label of a rest
pub const REST_LABEL: &str = "rest";

/// Pitch name, with octave when `show_octave` (`F#` / `F#4`)
pub fn pitch_label(pitch: &Pitch, show_octave: bool) -> String {
    if show_octave {
        pitch.name_with_octave()
    } else {
        pitch.name()
    }
}

/// Signed semitone distance; folded into one octave unless `show_octave`
pub fn interval_label(semitones: i32, show_octave: bool) -> String {
    if show_octave {
        semitones.to_string()
    } else {
        (semitones.abs() % 12 * semitones.signum()).to_string()
    }
}

/// Visit every element of the part with its absolute onset and measure position
fn for_each_element<'a>(view: &PartView<'a>, mut visit: impl FnMut(&'a TimedElement, QuarterLength, usize)) {
    for (idx, (start, measure)) in view.part.measures_with_offsets().enumerate() {
        for element in &measure.elements {
            visit(element, start + element.offset, idx + 1);
        }
    }
}

fn rest_event(element: &TimedElement, onset: QuarterLength, measure: usize, view: &PartView) -> LogicalEvent {
    LogicalEvent {
        activity: REST_LABEL.to_string(),
        event_type: EventType::Rest,
        onset,
        end: onset + element.duration,
        measure,
        attributes: context_attributes(element, view),
    }
}

/// One event per sounding pitch (chords lowest first), plus rests when enabled
pub fn note_events(view: &PartView, config: &Config) -> Vec<LogicalEvent> {
    let mut events = Vec::new();
    for_each_element(view, |element, onset, measure| match &element.kind {
        ElementKind::Note(_) | ElementKind::Chord(_) => {
            let attributes = context_attributes(element, view);
            for pitch in element.pitches() {
                events.push(LogicalEvent {
                    activity: pitch_label(&pitch, config.show_octave),
                    event_type: EventType::Pitch,
                    onset,
                    end: onset + element.duration,
                    measure,
                    attributes: attributes.clone(),
                });
            }
        }
        ElementKind::Rest if config.include_rests => {
            events.push(rest_event(element, onset, measure, view));
        }
        ElementKind::Rest | ElementKind::Unpitched => {}
    });
    events
}

/// One event per note after the first, labelled with the distance from the
/// previous note's top pitch. Rests (when enabled) are emitted without
/// breaking the chain.
pub fn interval_events(view: &PartView, config: &Config) -> Vec<LogicalEvent> {
    let mut events = Vec::new();
    let mut previous: Option<Pitch> = None;

    for_each_element(view, |element, onset, measure| {
        if element.is_rest() {
            if config.include_rests {
                events.push(rest_event(element, onset, measure, view));
            }
            return;
        }
        let Some(top) = element.pitches().pop() else {
            return;
        };
        if let Some(last) = previous.replace(top.clone()) {
            let semitones = last.semitones_to(&top);
            let mut attributes = context_attributes(element, view);
            attributes.push(("semitones".to_string(), (semitones as i64).into()));
            events.push(LogicalEvent {
                activity: interval_label(semitones, config.show_octave),
                event_type: EventType::Interval,
                onset,
                end: onset + element.duration,
                measure,
                attributes,
            });
        }
    });
    events
}
