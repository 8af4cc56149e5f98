/// Score model for MusicXML → event log conversion
///
/// This is not a full-featured music object model. It keeps what the event
/// extractor needs: parts, measures in written order, timed notes/chords/rests,
/// the notational context of each element and the repeat/jump markers needed
/// to unroll the score into performance order.

use num_rational::Rational64;
use num_traits::CheckedAdd;

use super::pitch::Pitch;

/// Position or length in quarter notes
pub type QuarterLength = Rational64;

#[derive(Debug, Clone)]
pub struct Score {
    pub name: String,             // File stem, used as case/log name
    pub title: Option<String>,
    pub composer: Option<String>,
    pub parts: Vec<Part>,         // One per MusicXML <part>, document order
}

#[derive(Debug, Clone)]
pub struct Part {
    pub id: String,
    pub name: String,
    pub instrument: Option<String>,
    pub measures: Vec<Measure>,
}

impl Part {
    /// Iterate measures together with their start offset inside the part
    pub fn measures_with_offsets(&self) -> impl Iterator<Item = (QuarterLength, &Measure)> + '_ {
        self.measures.iter().scan(QuarterLength::from_integer(0), |offset, measure| {
            let start = *offset;
            *offset = offset.checked_add(&measure.duration)?;
            Some((start, measure))
        })
    }

    /// Total length, or `None` when an absolute offset of the part (measure
    /// start, element onset or end, tempo mark) does not fit a `Rational64`.
    ///
    /// Performs the same additions as event extraction, so a part that passes
    /// can be timed without overflow.
    pub fn checked_length(&self) -> Option<QuarterLength> {
        let mut start = QuarterLength::from_integer(0);
        for measure in &self.measures {
            for element in &measure.elements {
                start
                    .checked_add(&element.offset)?
                    .checked_add(&element.duration)?;
            }
            for (offset, _) in &measure.tempo_changes {
                start.checked_add(offset)?;
            }
            start = start.checked_add(&measure.duration)?;
        }
        Some(start)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Measure {
    pub number: String,                        // As written in number="..."
    pub duration: QuarterLength,
    pub elements: Vec<TimedElement>,           // Sorted by offset (stable)
    pub tempo_changes: Vec<(QuarterLength, f64)>, // (offset in measure, quarter bpm)
    pub repeat: RepeatMarks,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimedElement {
    pub offset: QuarterLength,    // Relative to the measure start
    pub duration: QuarterLength,
    pub kind: ElementKind,
    pub context: Context,
}

impl TimedElement {
    pub fn is_rest(&self) -> bool {
        matches!(self.kind, ElementKind::Rest)
    }

    /// Sounding pitches, lowest first; empty for rests and unpitched notes
    pub fn pitches(&self) -> Vec<Pitch> {
        match &self.kind {
            ElementKind::Note(pitch) => vec![pitch.clone()],
            ElementKind::Chord(pitches) => {
                let mut sorted = pitches.clone();
                sorted.sort();
                sorted
            }
            ElementKind::Rest | ElementKind::Unpitched => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Note(Pitch),
    Chord(Vec<Pitch>),
    Rest,
    Unpitched,
}

/// Notation in effect at an element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    pub clef: Option<Clef>,
    pub key_signature: Option<KeySignature>,
    pub time_signature: Option<TimeSignature>,
    pub tempo: Option<f64>, // Quarter notes per minute
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clef {
    pub sign: String,
    pub line: Option<u8>,
    pub octave_change: i8,
}

impl Clef {
    /// Common clef names, falling back to sign + line (e.g. `C3`)
    pub fn name(&self) -> String {
        let base = match (self.sign.as_str(), self.line) {
            ("G", Some(2)) | ("G", None) => "treble".to_string(),
            ("G", Some(1)) => "french violin".to_string(),
            ("F", Some(4)) | ("F", None) => "bass".to_string(),
            ("F", Some(3)) => "baritone".to_string(),
            ("C", Some(3)) | ("C", None) => "alto".to_string(),
            ("C", Some(4)) => "tenor".to_string(),
            ("C", Some(1)) => "soprano".to_string(),
            ("percussion", _) => "percussion".to_string(),
            ("TAB", _) => "tab".to_string(),
            (sign, Some(line)) => format!("{}{}", sign, line),
            (sign, None) => sign.to_string(),
        };
        match self.octave_change {
            0 => base,
            n if n > 0 => format!("{} {}va", base, 1 + 7 * n as i32),
            n => format!("{} {}vb", base, 1 + 7 * n.unsigned_abs() as i32),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySignature {
    pub fifths: i8,
}

impl KeySignature {
    pub fn describe(&self) -> String {
        match self.fifths {
            0 => "no sharps or flats".to_string(),
            1 => "1 sharp".to_string(),
            -1 => "1 flat".to_string(),
            n if n > 0 => format!("{} sharps", n),
            n => format!("{} flats", n.unsigned_abs()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub beats: u32,
    pub beat_type: u32,
}

impl TimeSignature {
    /// Length of a full bar in quarter notes
    pub fn bar_length(&self) -> QuarterLength {
        QuarterLength::new(self.beats as i64 * 4, self.beat_type.max(1) as i64)
    }
}

/// Repeat barlines, voltas and navigation marks of one measure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepeatMarks {
    pub forward: bool,             // |: on the left barline
    pub backward: Option<u32>,     // :| on the right barline, with times="" (default 2)
    pub ending: Option<Vec<u32>>,  // Volta numbers this measure belongs to
    pub segno: bool,
    pub coda: bool,
    pub fine: bool,
    pub da_capo: bool,
    pub dal_segno: bool,
    pub to_coda: bool,
}

impl RepeatMarks {
    pub fn has_jump(&self) -> bool {
        self.da_capo || self.dal_segno
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measure(duration: i64) -> Measure {
        Measure {
            number: String::new(),
            duration: QuarterLength::from_integer(duration),
            ..Default::default()
        }
    }

    #[test]
    fn test_measure_offsets_accumulate() {
        let part = Part {
            id: "P1".to_string(),
            name: "Piano".to_string(),
            instrument: None,
            measures: vec![measure(4), measure(3), measure(4)],
        };
        let offsets: Vec<i64> = part
            .measures_with_offsets()
            .map(|(offset, _)| offset.to_integer())
            .collect();
        assert_eq!(offsets, vec![0, 4, 7]);
        assert_eq!(part.checked_length(), Some(QuarterLength::from_integer(11)));
    }

    #[test]
    fn test_overflowing_length_is_detected() {
        let huge = Measure {
            number: String::new(),
            duration: QuarterLength::from_integer(i64::MAX / 2 + 1),
            ..Default::default()
        };
        let part = Part {
            id: "P1".to_string(),
            name: "Piano".to_string(),
            instrument: None,
            measures: vec![huge.clone(), huge],
        };
        assert_eq!(part.checked_length(), None);
        // Offsets stop instead of wrapping around
        assert_eq!(part.measures_with_offsets().count(), 1);
    }

    #[test]
    fn test_chord_pitches_sorted() {
        let element = TimedElement {
            offset: QuarterLength::from_integer(0),
            duration: QuarterLength::from_integer(1),
            kind: ElementKind::Chord(vec![
                Pitch::new('G', 0, 4),
                Pitch::new('C', 0, 4),
                Pitch::new('E', 0, 4),
            ]),
            context: Context::default(),
        };
        let midi: Vec<u8> = element.pitches().iter().map(|p| p.midi()).collect();
        assert_eq!(midi, vec![60, 64, 67]);
    }

    #[test]
    fn test_context_descriptions() {
        let clef = Clef { sign: "G".to_string(), line: Some(2), octave_change: -1 };
        assert_eq!(clef.name(), "treble 8vb");
        assert_eq!(KeySignature { fifths: -3 }.describe(), "3 flats");
        assert_eq!(KeySignature { fifths: 0 }.describe(), "no sharps or flats");
        let six_eight = TimeSignature { beats: 6, beat_type: 8 };
        assert_eq!(six_eight.bar_length(), QuarterLength::from_integer(3));
    }
}
