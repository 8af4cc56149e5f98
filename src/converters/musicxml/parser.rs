//! MusicXML parser implementation
//!
//! Converts a `<score-partwise>` document into the score model using roxmltree.
//! Time is tracked in quarter lengths, so `<divisions>` changes and
//! `<backup>`/`<forward>` in multi-voice measures are resolved exactly.

use std::collections::HashMap;

use num_traits::{CheckedAdd, CheckedSub};
use roxmltree::{Document, Node, ParsingOptions};

use super::errors::ParseError;
use crate::models::{
    Clef, Context, ElementKind, KeySignature, Measure, Part, Pitch, QuarterLength, RepeatMarks,
    Score, TimeSignature, TimedElement,
};

/// Largest `<divisions>` or `<duration>` value accepted
const MAX_DIVISIONS: i64 = i32::MAX as i64;

/// Result type for MusicXML parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse a MusicXML document into a [`Score`] called `name`
///
/// # Example
///
/// ```ignore
/// let musicxml = r#"<?xml version="1.0"?>
/// <score-partwise version="3.1">
///   <part-list>
///     <score-part id="P1"><part-name>Piano</part-name></score-part>
///   </part-list>
///   <part id="P1">
///     <measure number="1">
///       <note><pitch><step>C</step><octave>4</octave></pitch><duration>4</duration></note>
///     </measure>
///   </part>
/// </score-partwise>"#;
///
/// let score = parse_musicxml(musicxml, "example")?;
/// ```
pub fn parse_musicxml(xml: &str, name: &str) -> ParseResult<Score> {
    // MusicXML files usually carry a DOCTYPE; roxmltree only rejects it by default
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xml, options)
        .map_err(|e| ParseError::InvalidXml(e.to_string()))?;

    let root = doc.root_element();
    match root.tag_name().name() {
        "score-partwise" => parse_score_partwise(root, name),
        "score-timewise" => Err(ParseError::UnsupportedFormat(
            "score-timewise format (use score-partwise instead)".to_string(),
        )),
        other => Err(ParseError::UnsupportedFormat(format!(
            "Expected score-partwise, found {}",
            other
        ))),
    }
}

fn parse_score_partwise(root: Node, name: &str) -> ParseResult<Score> {
    let part_info = root
        .children()
        .find(|n| n.has_tag_name("part-list"))
        .map(parse_part_list)
        .unwrap_or_default();

    let mut parts = Vec::new();
    for part_node in root.children().filter(|n| n.has_tag_name("part")) {
        let id = part_node
            .attribute("id")
            .ok_or_else(|| ParseError::MissingRequiredElement("part id attribute".to_string()))?;
        let info = part_info.get(id).cloned().unwrap_or_default();
        parts.push(parse_part(part_node, id, info)?);
    }

    if parts.is_empty() {
        return Err(ParseError::MissingRequiredElement(
            "No parts found in score".to_string(),
        ));
    }

    Ok(Score {
        name: name.to_string(),
        title: extract_title(root),
        composer: extract_composer(root),
        parts,
    })
}

/// Name and instrument declared for a part in `<part-list>`
#[derive(Debug, Clone, Default)]
struct PartInfo {
    name: String,
    instrument: Option<String>,
}

fn parse_part_list(part_list: Node) -> HashMap<String, PartInfo> {
    let mut info = HashMap::new();

    for score_part in part_list.children().filter(|n| n.has_tag_name("score-part")) {
        let Some(id) = score_part.attribute("id") else {
            continue;
        };
        let name = child_text(score_part, "part-name").unwrap_or_default();
        let instrument = score_part
            .children()
            .find(|n| n.has_tag_name("score-instrument"))
            .and_then(|n| child_text(n, "instrument-name"));

        info.insert(id.to_string(), PartInfo { name, instrument });
    }

    info
}

/// Extract title: movement-title first, then work/work-title
fn extract_title(score: Node) -> Option<String> {
    child_text(score, "movement-title").or_else(|| {
        score
            .children()
            .find(|n| n.has_tag_name("work"))
            .and_then(|work| child_text(work, "work-title"))
    })
}

/// Extract composer from identification/creator, preferring type="composer"
fn extract_composer(score: Node) -> Option<String> {
    let identification = score.children().find(|n| n.has_tag_name("identification"))?;
    let creators: Vec<Node> = identification
        .children()
        .filter(|n| n.has_tag_name("creator"))
        .collect();

    creators
        .iter()
        .filter(|n| n.attribute("type") == Some("composer"))
        .chain(creators.iter())
        .find_map(|n| trimmed_text(*n))
}

/// State carried from one measure to the next within a part
struct PartState {
    divisions: i64,
    context: Context,
    open_ending: Option<Vec<u32>>,
}

impl Default for PartState {
    fn default() -> Self {
        PartState {
            divisions: 1,
            context: Context::default(),
            open_ending: None,
        }
    }
}

fn parse_part(part_node: Node, id: &str, info: PartInfo) -> ParseResult<Part> {
    let mut state = PartState::default();
    let mut measures = Vec::new();

    for measure_node in part_node.children().filter(|n| n.has_tag_name("measure")) {
        measures.push(parse_measure(measure_node, &mut state)?);
    }

    let part = Part {
        id: id.to_string(),
        name: info.name,
        instrument: info.instrument,
        measures,
    };
    if part.checked_length().is_none() {
        return Err(ParseError::InvalidValue {
            element: "part length".to_string(),
            value: format!("part {} is too long to time", id),
        });
    }
    Ok(part)
}

/// Cursor bookkeeping while walking one `<measure>`
struct MeasureCursor {
    position: QuarterLength,
    furthest: QuarterLength,
    last_onset_element: Option<usize>,
}

impl MeasureCursor {
    fn advance(&mut self, by: QuarterLength) -> ParseResult<()> {
        self.position = self
            .position
            .checked_add(&by)
            .ok_or_else(|| out_of_range("measure length", self.position, by))?;
        if self.position > self.furthest {
            self.furthest = self.position;
        }
        Ok(())
    }

    fn back(&mut self, by: QuarterLength) -> ParseResult<()> {
        self.position = self
            .position
            .checked_sub(&by)
            .ok_or_else(|| out_of_range("backup", self.position, by))?;
        if self.position < QuarterLength::from_integer(0) {
            self.position = QuarterLength::from_integer(0);
        }
        Ok(())
    }
}

fn out_of_range(element: &str, position: QuarterLength, by: QuarterLength) -> ParseError {
    ParseError::InvalidValue {
        element: element.to_string(),
        value: format!("{} + {}", position, by),
    }
}

fn parse_measure(measure_node: Node, state: &mut PartState) -> ParseResult<Measure> {
    let mut cursor = MeasureCursor {
        position: QuarterLength::from_integer(0),
        furthest: QuarterLength::from_integer(0),
        last_onset_element: None,
    };
    let mut elements: Vec<TimedElement> = Vec::new();
    let mut tempo_changes = Vec::new();
    let mut repeat = RepeatMarks::default();
    let mut ending_closed = false;

    for child in measure_node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "attributes" => parse_attributes(child, state)?,
            "note" => parse_note(child, state, &mut cursor, &mut elements)?,
            "backup" => {
                let duration = parse_duration(child, state.divisions)?;
                cursor.back(duration)?;
            }
            "forward" => {
                let duration = parse_duration(child, state.divisions)?;
                cursor.advance(duration)?;
            }
            "direction" => {
                parse_direction(child, state, cursor.position, &mut repeat, &mut tempo_changes)
            }
            "sound" => apply_sound(child, state, cursor.position, &mut repeat, &mut tempo_changes),
            "barline" => {
                if parse_barline(child, state, &mut repeat) {
                    ending_closed = true;
                }
            }
            _ => {
                // print, harmony, figured-bass, etc. carry nothing we extract
            }
        }
    }

    repeat.ending = state.open_ending.clone();
    if ending_closed {
        state.open_ending = None;
    }

    // Stable: simultaneous elements keep document order
    elements.sort_by(|a, b| a.offset.cmp(&b.offset));

    let mut duration = cursor.furthest;
    if duration == QuarterLength::from_integer(0) {
        if let Some(time) = state.context.time_signature {
            duration = time.bar_length();
        }
    }

    Ok(Measure {
        number: measure_node.attribute("number").unwrap_or_default().to_string(),
        duration,
        elements,
        tempo_changes,
        repeat,
    })
}

fn parse_attributes(attr_node: Node, state: &mut PartState) -> ParseResult<()> {
    for child in attr_node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "divisions" => {
                let text = trimmed_text(child).unwrap_or_default();
                state.divisions = text
                    .parse::<i64>()
                    .ok()
                    .filter(|d| *d > 0 && *d <= MAX_DIVISIONS)
                    .ok_or_else(|| ParseError::InvalidValue {
                        element: "divisions".to_string(),
                        value: text.clone(),
                    })?;
            }
            "key" => {
                if let Some(text) = child_text(child, "fifths") {
                    let fifths: i8 = text.parse().map_err(|_| ParseError::InvalidValue {
                        element: "fifths".to_string(),
                        value: text.clone(),
                    })?;
                    state.context.key_signature = Some(KeySignature { fifths });
                }
            }
            "time" => {
                if child.children().any(|n| n.has_tag_name("senza-misura")) {
                    state.context.time_signature = None;
                    continue;
                }
                let beats = child_text(child, "beats").and_then(|t| parse_beats(&t));
                let beat_type = child_text(child, "beat-type").and_then(|t| t.parse::<u32>().ok());
                if let (Some(beats), Some(beat_type)) = (beats, beat_type) {
                    if beats > 0 && beat_type > 0 {
                        state.context.time_signature = Some(TimeSignature { beats, beat_type });
                    }
                }
            }
            "clef" => {
                // Only the first staff's clef describes the part
                if matches!(child.attribute("number"), None | Some("1")) {
                    if let Some(sign) = child_text(child, "sign") {
                        state.context.clef = Some(Clef {
                            sign,
                            line: child_text(child, "line").and_then(|t| t.parse().ok()),
                            octave_change: child_text(child, "clef-octave-change")
                                .and_then(|t| t.parse().ok())
                                .unwrap_or(0),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// Parse `<beats>` allowing additive meters such as `3+2`
fn parse_beats(text: &str) -> Option<u32> {
    text.split('+')
        .map(|part| part.trim().parse::<u32>().ok())
        .sum()
}

fn parse_note(
    note_node: Node,
    state: &PartState,
    cursor: &mut MeasureCursor,
    elements: &mut Vec<TimedElement>,
) -> ParseResult<()> {
    // Grace notes take no time and are not performed as separate events
    if note_node.children().any(|n| n.has_tag_name("grace")) {
        return Ok(());
    }

    let is_chord = note_node.children().any(|n| n.has_tag_name("chord"));
    let is_rest = note_node.children().any(|n| n.has_tag_name("rest"));
    let is_unpitched = note_node.children().any(|n| n.has_tag_name("unpitched"));
    let duration = parse_duration(note_node, state.divisions)?;

    let pitch = match note_node.children().find(|n| n.has_tag_name("pitch")) {
        Some(pitch_node) => Some(parse_pitch(pitch_node)?),
        None => None,
    };

    if is_chord {
        if let Some(index) = cursor.last_onset_element {
            if let (Some(pitch), Some(previous)) = (pitch.clone(), elements.get_mut(index)) {
                let kind = std::mem::replace(&mut previous.kind, ElementKind::Rest);
                previous.kind = match kind {
                    ElementKind::Note(first) => ElementKind::Chord(vec![first, pitch]),
                    ElementKind::Chord(mut pitches) => {
                        pitches.push(pitch);
                        ElementKind::Chord(pitches)
                    }
                    other => other,
                };
            }
            return Ok(());
        }
    }

    let kind = if is_rest {
        ElementKind::Rest
    } else if is_unpitched {
        ElementKind::Unpitched
    } else if let Some(pitch) = pitch {
        ElementKind::Note(pitch)
    } else {
        return Err(ParseError::MissingRequiredElement(
            "note without pitch, rest or unpitched".to_string(),
        ));
    };

    elements.push(TimedElement {
        offset: cursor.position,
        duration,
        kind,
        context: state.context.clone(),
    });
    cursor.last_onset_element = Some(elements.len() - 1);
    cursor.advance(duration)

}

fn parse_pitch(pitch_node: Node) -> ParseResult<Pitch> {
    let step_text = child_text(pitch_node, "step")
        .ok_or_else(|| ParseError::MissingRequiredElement("pitch step".to_string()))?;
    let step = match step_text.as_str() {
        "A" | "B" | "C" | "D" | "E" | "F" | "G" => step_text.chars().next().unwrap_or('C'),
        _ => {
            return Err(ParseError::InvalidValue {
                element: "step".to_string(),
                value: step_text,
            })
        }
    };

    // Microtonal alterations (e.g. -0.5) are rounded to the nearest semitone
    let alter = child_text(pitch_node, "alter")
        .and_then(|t| t.parse::<f64>().ok())
        .map(|a| a.round() as i8)
        .unwrap_or(0);

    let octave_text = child_text(pitch_node, "octave")
        .ok_or_else(|| ParseError::MissingRequiredElement("pitch octave".to_string()))?;
    let octave = octave_text.parse::<i8>().map_err(|_| ParseError::InvalidValue {
        element: "octave".to_string(),
        value: octave_text.clone(),
    })?;

    Ok(Pitch::new(step, alter, octave))
}

/// Read the `<duration>` child of `node` as quarter lengths (0 when absent)
fn parse_duration(node: Node, divisions: i64) -> ParseResult<QuarterLength> {
    let Some(text) = child_text(node, "duration") else {
        return Ok(QuarterLength::from_integer(0));
    };
    let divs: i64 = text
        .parse::<f64>()
        .ok()
        .filter(|d| *d >= 0.0 && *d <= MAX_DIVISIONS as f64)
        .map(|d| d.round() as i64)
        .ok_or_else(|| ParseError::InvalidValue {
            element: "duration".to_string(),
            value: text.clone(),
        })?;
    Ok(QuarterLength::new(divs, divisions))
}

fn parse_direction(
    direction: Node,
    state: &mut PartState,
    position: QuarterLength,
    repeat: &mut RepeatMarks,
    tempo_changes: &mut Vec<(QuarterLength, f64)>,
) {
    let sound = direction.children().find(|n| n.has_tag_name("sound"));
    let sound_sets_tempo = sound.map(|s| s.attribute("tempo").is_some()).unwrap_or(false);
    let mut words_to_coda = false;
    let mut has_coda_sign = false;

    for direction_type in direction.children().filter(|n| n.has_tag_name("direction-type")) {
        for mark in direction_type.children().filter(|n| n.is_element()) {
            match mark.tag_name().name() {
                "segno" => repeat.segno = true,
                "coda" => has_coda_sign = true,
                "words" => {
                    if let Some(words) = trimmed_text(mark) {
                        words_to_coda |= apply_words(&words, repeat);
                    }
                }
                "metronome" if !sound_sets_tempo => {
                    if let Some(bpm) = metronome_quarter_bpm(mark) {
                        set_tempo(state, position, bpm, tempo_changes);
                    }
                }
                _ => {}
            }
        }
    }

    // The coda sign is printed both at "To Coda" and at the coda itself
    let sound_to_coda = sound.map(|s| s.attribute("tocoda").is_some()).unwrap_or(false);
    if has_coda_sign && !words_to_coda && !sound_to_coda {
        repeat.coda = true;
    }

    if let Some(sound) = sound {
        apply_sound(sound, state, position, repeat, tempo_changes);
    }
}

/// Interpret navigation text; returns true when the text is a "To Coda" instruction
fn apply_words(words: &str, repeat: &mut RepeatMarks) -> bool {
    let lower = words.to_lowercase();
    if lower == "fine" {
        repeat.fine = true;
    } else if lower.starts_with("d.c.") || lower.starts_with("da capo") {
        repeat.da_capo = true;
    } else if lower.starts_with("d.s.") || lower.starts_with("dal segno") {
        repeat.dal_segno = true;
    } else if lower.starts_with("to coda") {
        repeat.to_coda = true;
        return true;
    }
    false
}

fn apply_sound(
    sound: Node,
    state: &mut PartState,
    position: QuarterLength,
    repeat: &mut RepeatMarks,
    tempo_changes: &mut Vec<(QuarterLength, f64)>,
) {
    if let Some(bpm) = sound
        .attribute("tempo")
        .and_then(|t| t.trim().parse::<f64>().ok())
        .filter(|bpm| *bpm > 0.0)
    {
        set_tempo(state, position, bpm, tempo_changes);
    }
    if sound.attribute("dacapo") == Some("yes") {
        repeat.da_capo = true;
    }
    if sound.attribute("dalsegno").is_some() {
        repeat.dal_segno = true;
    }
    if sound.attribute("segno").is_some() {
        repeat.segno = true;
    }
    if sound.attribute("coda").is_some() {
        repeat.coda = true;
    }
    if sound.attribute("tocoda").is_some() {
        repeat.to_coda = true;
    }
    if sound.attribute("fine").is_some() {
        repeat.fine = true;
    }
}

fn set_tempo(
    state: &mut PartState,
    position: QuarterLength,
    bpm: f64,
    tempo_changes: &mut Vec<(QuarterLength, f64)>,
) {
    state.context.tempo = Some(bpm);
    tempo_changes.retain(|(offset, _)| *offset != position);
    tempo_changes.push((position, bpm));
}

/// Convert `<metronome>` to quarter notes per minute
fn metronome_quarter_bpm(metronome: Node) -> Option<f64> {
    let per_minute: f64 = child_text(metronome, "per-minute")?.parse().ok()?;
    let unit = match child_text(metronome, "beat-unit")?.as_str() {
        "whole" => 4.0,
        "half" => 2.0,
        "quarter" => 1.0,
        "eighth" => 0.5,
        "16th" => 0.25,
        "32nd" => 0.125,
        _ => return None,
    };
    let dots = metronome
        .children()
        .take_while(|n| !n.has_tag_name("per-minute"))
        .filter(|n| n.has_tag_name("beat-unit-dot"))
        .count();
    let mut length = unit;
    let mut dot_value = unit;
    for _ in 0..dots {
        dot_value /= 2.0;
        length += dot_value;
    }
    let bpm = per_minute * length;
    (bpm > 0.0).then_some(bpm)
}

/// Apply repeat and ending marks; returns true when an ending closes at this barline
fn parse_barline(barline: Node, state: &mut PartState, repeat: &mut RepeatMarks) -> bool {
    let mut closes_ending = false;

    if let Some(repeat_node) = barline.children().find(|n| n.has_tag_name("repeat")) {
        match repeat_node.attribute("direction") {
            Some("forward") => repeat.forward = true,
            Some("backward") => {
                let times = repeat_node
                    .attribute("times")
                    .and_then(|t| t.trim().parse::<u32>().ok())
                    .unwrap_or(2);
                repeat.backward = Some(times);
            }
            _ => {}
        }
    }

    if let Some(ending) = barline.children().find(|n| n.has_tag_name("ending")) {
        match ending.attribute("type") {
            Some("start") => {
                state.open_ending = Some(parse_ending_numbers(ending.attribute("number").unwrap_or("")));
            }
            Some("stop") | Some("discontinue") => {
                if state.open_ending.is_none() {
                    // Stop without a start: the ending covers just this measure
                    state.open_ending =
                        Some(parse_ending_numbers(ending.attribute("number").unwrap_or("")));
                }
                closes_ending = true;
            }
            _ => {}
        }
    }

    if barline.children().any(|n| n.has_tag_name("segno")) {
        repeat.segno = true;
    }
    if barline.children().any(|n| n.has_tag_name("coda")) {
        repeat.coda = true;
    }

    closes_ending
}

/// Parse volta numbers such as `1`, `1, 2` or `1 2`
fn parse_ending_numbers(text: &str) -> Vec<u32> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter_map(|n| n.trim().trim_end_matches('.').parse::<u32>().ok())
        .collect()
}

fn child_text(node: Node, name: &str) -> Option<String> {
    node.children()
        .find(|n| n.has_tag_name(name))
        .and_then(trimmed_text)
}

fn trimmed_text(node: Node) -> Option<String> {
    node.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
