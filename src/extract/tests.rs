//! Unit tests for event extraction

use super::*;
use crate::analysis::expand_score;
use crate::converters::musicxml::parse_musicxml;
use crate::converters::xes::format_timestamp;

const ATTRIBUTES: &str = r#"<attributes>
        <divisions>1</divisions>
        <key><fifths>0</fifths></key>
        <time><beats>4</beats><beat-type>4</beat-type></time>
        <clef><sign>G</sign><line>2</line></clef>
      </attributes>"#;

fn note(step: &str, alter: i8, octave: u8, duration: u32) -> String {
    format!(
        "<note><pitch><step>{}</step><alter>{}</alter><octave>{}</octave></pitch><duration>{}</duration></note>",
        step, alter, octave, duration
    )
}

fn chord_note(step: &str, octave: u8, duration: u32) -> String {
    format!(
        "<note><chord/><pitch><step>{}</step><octave>{}</octave></pitch><duration>{}</duration></note>",
        step, octave, duration
    )
}

fn rest(duration: u32) -> String {
    format!("<note><rest/><duration>{}</duration></note>", duration)
}

/// Build a score from (part name, measures) pairs; the first measure of each
/// part gets divisions, key, time and clef
fn score(parts: &[(&str, Vec<String>)]) -> Score {
    let mut part_list = String::new();
    let mut body = String::new();
    for (idx, (name, measures)) in parts.iter().enumerate() {
        part_list.push_str(&format!(
            r#"<score-part id="P{0}"><part-name>{1}</part-name></score-part>"#,
            idx + 1,
            name
        ));
        body.push_str(&format!(r#"<part id="P{}">"#, idx + 1));
        for (number, content) in measures.iter().enumerate() {
            let attributes = if number == 0 { ATTRIBUTES } else { "" };
            body.push_str(&format!(
                r#"<measure number="{}">{}{}</measure>"#,
                number + 1,
                attributes,
                content
            ));
        }
        body.push_str("</part>");
    }
    let xml = format!(
        r#"<?xml version="1.0"?><score-partwise version="3.1"><part-list>{}</part-list>{}</score-partwise>"#,
        part_list, body
    );
    let parsed = parse_musicxml(&xml, "piece").expect("test score parses");
    expand_score(&parsed).expect("test score expands")
}

/// C D | E F, half notes
fn four_note_score() -> Score {
    score(&[(
        "Piano",
        vec![
            note("C", 0, 4, 2) + &note("D", 0, 4, 2),
            note("E", 0, 4, 2) + &note("F", 0, 4, 2),
        ],
    )])
}

fn config() -> Config {
    Config::new("in", "out")
}

fn activities(trace: &Trace) -> Vec<&str> {
    trace.events.iter().map(|e| e.activity.as_str()).collect()
}

#[test]
fn test_four_notes_default_config() {
    let log = extract(&four_note_score(), &config());
    assert_eq!(log.name, "piece");
    assert_eq!(log.traces.len(), 1);

    let trace = &log.traces[0];
    assert_eq!(trace.case_id, "piece");
    assert_eq!(activities(trace), vec!["C", "D", "E", "F"]);
    let order: Vec<usize> = trace.events.iter().map(|e| e.order_index).collect();
    assert_eq!(order, vec![0, 1, 2, 3]);
    assert!(trace.events.iter().all(|e| e.lifecycle == Lifecycle::Complete));
    assert!(trace.events.iter().all(|e| e.event_type == EventType::Pitch));

    // Half note at 80 bpm ends after 1.5 s
    assert_eq!(
        format_timestamp(&trace.events[0].timestamp),
        "2024-01-01T00:00:01.500+00:00"
    );
    assert_eq!(trace.events[2].measure, 2);
}

#[test]
fn test_measure_as_event() {
    let config = config().with_granularity(Granularity::Measure);
    let log = extract(&four_note_score(), &config);
    let trace = &log.traces[0];
    assert_eq!(activities(trace), vec!["C_D", "E_F"]);
    assert!(trace.events.iter().all(|e| e.event_type == EventType::Measure));
    assert_eq!(trace.base_event_count, 2);
}

#[test]
fn test_start_and_complete_pairs() {
    let config = config()
        .with_lifecycles(&[Lifecycle::Complete, Lifecycle::Start])
        .unwrap();
    let log = extract(&four_note_score(), &config);
    let trace = &log.traces[0];
    assert_eq!(trace.events.len(), 8);
    assert_eq!(trace.base_event_count, 4);

    for label in ["C", "D", "E", "F"] {
        let start = trace
            .events
            .iter()
            .find(|e| e.activity == label && e.lifecycle == Lifecycle::Start)
            .unwrap();
        let complete = trace
            .events
            .iter()
            .find(|e| e.activity == label && e.lifecycle == Lifecycle::Complete)
            .unwrap();
        assert!(start.order_index < complete.order_index);
        assert!(start.timestamp < complete.timestamp);
    }

    // A note's complete and the next note's start share a timestamp; the complete comes first
    assert_eq!(trace.events[1].activity, "C");
    assert_eq!(trace.events[1].lifecycle, Lifecycle::Complete);
    assert_eq!(trace.events[2].activity, "D");
    assert_eq!(trace.events[2].lifecycle, Lifecycle::Start);
}

#[test]
fn test_multi_case_splits_parts() {
    let piece = score(&[
        ("Flute", vec![note("G", 0, 5, 4)]),
        ("Cello", vec![note("C", 0, 3, 2) + &note("G", 0, 2, 2)]),
    ]);
    let config = Config {
        multi_case: true,
        ..config()
    };
    let log = extract(&piece, &config);
    let ids: Vec<&str> = log.traces.iter().map(|t| t.case_id.as_str()).collect();
    assert_eq!(ids, vec!["piece - Flute 1", "piece - Cello 1"]);

    assert_eq!(activities(&log.traces[0]), vec!["G"]);
    assert_eq!(activities(&log.traces[1]), vec!["C", "G"]);
    for trace in &log.traces {
        let part = trace.attributes[0].1.clone();
        assert!(trace.events.iter().all(|e| e.attribute("Part") == Some(&part)));
    }
}

#[test]
fn test_single_case_merges_parts_in_time_order() {
    let piece = score(&[
        ("Flute", vec![note("G", 0, 5, 4)]),
        ("Cello", vec![note("C", 0, 3, 1) + &note("E", 0, 3, 3)]),
    ]);
    let log = extract(&piece, &config());
    assert_eq!(log.traces.len(), 1);
    // Complete events ordered by their end: C (1), then G and E (4) in part order
    assert_eq!(activities(&log.traces[0]), vec!["C", "G", "E"]);
}

#[test]
fn test_lead_part_only() {
    let piece = score(&[
        ("Flute", vec![note("G", 0, 5, 4)]),
        ("Cello", vec![note("C", 0, 3, 4)]),
    ]);
    let config = Config {
        lead_part_only: true,
        ..config()
    };
    let log = extract(&piece, &config);
    assert_eq!(activities(&log.traces[0]), vec!["G"]);
}

#[test]
fn test_rests_only_when_enabled() {
    let piece = score(&[("Piano", vec![note("C", 0, 4, 2) + &rest(2)])]);

    let log = extract(&piece, &config());
    assert!(log.traces[0].events.iter().all(|e| e.activity != notes::REST_LABEL));

    let with_rests = Config {
        include_rests: true,
        ..config()
    };
    let log = extract(&piece, &with_rests);
    assert_eq!(activities(&log.traces[0]), vec!["C", "rest"]);
    assert_eq!(log.traces[0].events[1].event_type, EventType::Rest);
}

#[test]
fn test_octave_only_when_enabled() {
    let piece = score(&[("Piano", vec![note("F", 1, 4, 2) + &note("B", -1, 3, 2)])]);

    let log = extract(&piece, &config());
    assert_eq!(activities(&log.traces[0]), vec!["F#", "Bb"]);
    assert!(log.traces[0]
        .events
        .iter()
        .all(|e| !e.activity.chars().any(|c| c.is_ascii_digit())));

    let with_octave = Config {
        show_octave: true,
        ..config()
    };
    let log = extract(&piece, &with_octave);
    assert_eq!(activities(&log.traces[0]), vec!["F#4", "Bb3"]);
}

#[test]
fn test_chord_pitches_lowest_first() {
    let piece = score(&[(
        "Piano",
        vec![note("G", 0, 4, 4) + &chord_note("C", 4, 4) + &chord_note("E", 4, 4)],
    )]);
    let log = extract(&piece, &config());
    assert_eq!(activities(&log.traces[0]), vec!["C", "E", "G"]);
}

#[test]
fn test_intervals() {
    let piece = score(&[(
        "Piano",
        vec![
            note("C", 0, 4, 1) + &note("E", 0, 4, 1) + &note("G", 0, 4, 1) + &note("C", 0, 5, 1),
            note("B", 0, 3, 2) + &rest(2),
        ],
    )]);
    let config = config().with_granularity(Granularity::Interval);
    let log = extract(&piece, &config);
    assert_eq!(activities(&log.traces[0]), vec!["4", "3", "5", "-1"]);
    assert!(log.traces[0]
        .events
        .iter()
        .all(|e| e.event_type == EventType::Interval));

    let full = Config {
        show_octave: true,
        include_rests: true,
        ..config
    };
    let log = extract(&piece, &full);
    assert_eq!(activities(&log.traces[0]), vec!["4", "3", "5", "-13", "rest"]);
}

#[test]
fn test_interval_labels() {
    assert_eq!(notes::interval_label(14, false), "2");
    assert_eq!(notes::interval_label(-13, false), "-1");
    assert_eq!(notes::interval_label(12, false), "0");
    assert_eq!(notes::interval_label(-13, true), "-13");
}

#[test]
fn test_harmony_shift_through_extract() {
    let c_bar = || note("C", 0, 4, 1) + &note("E", 0, 4, 1) + &note("G", 0, 4, 1) + &note("C", 0, 5, 1);
    let piece = score(&[("Piano", vec![c_bar(), c_bar()])]);
    let config = config().with_granularity(Granularity::HarmonyShift);
    let log = extract(&piece, &config);
    let trace = &log.traces[0];
    assert_eq!(trace.case_id, "piece");
    assert_eq!(activities(trace), vec!["C major"]);
    assert_eq!(trace.events[0].event_type, EventType::HarmonicShift);
    assert_eq!(trace.events[0].attribute("scale_degree"), Some(&AttributeValue::Float(1.0)));
}

#[test]
fn test_context_attributes() {
    let log = extract(&four_note_score(), &config());
    let event = &log.traces[0].events[0];
    assert_eq!(event.attribute("Clef"), Some(&AttributeValue::from("treble")));
    assert_eq!(
        event.attribute("KeySignature"),
        Some(&AttributeValue::from("no sharps or flats"))
    );
    assert_eq!(event.attribute("TimeSignature"), Some(&AttributeValue::from("4/4")));
    assert_eq!(event.attribute("Instrument"), Some(&AttributeValue::from("Piano")));
    assert_eq!(event.attribute("Part"), Some(&AttributeValue::from("Piano 1")));
}

#[test]
fn test_part_labels_count_duplicates() {
    let part = |name: &str| Part {
        id: String::new(),
        name: name.to_string(),
        instrument: None,
        measures: Vec::new(),
    };
    let labels = part_labels(&[part("Piano"), part("Piano"), part(" "), part("Violin")]);
    assert_eq!(labels, vec!["Piano 1", "Piano 2", "Part 1", "Violin 1"]);
}

#[test]
fn test_repeats_are_played_out() {
    let piece = score(&[(
        "Piano",
        vec![
            note("C", 0, 4, 4)
                + r#"<barline location="right"><repeat direction="backward"/></barline>"#,
            note("D", 0, 4, 4),
        ],
    )]);
    let log = extract(&piece, &config());
    assert_eq!(activities(&log.traces[0]), vec!["C", "C", "D"]);
    let measures: Vec<usize> = log.traces[0].events.iter().map(|e| e.measure).collect();
    assert_eq!(measures, vec![1, 2, 3]);
}
