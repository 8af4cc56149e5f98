use std::cmp::Ordering;
use std::fmt;

/// A written pitch as it appears in MusicXML `<pitch>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pitch {
    pub step: char,  // C, D, E, F, G, A, B
    pub alter: i8,   // -2 = double flat .. +2 = double sharp
    pub octave: i8,  // C4 = middle C
}

impl Pitch {
    pub fn new(step: char, alter: i8, octave: i8) -> Self {
        Self { step, alter, octave }
    }

    /// MIDI note number (C4 = 60), clamped to 0-127
    pub fn midi(&self) -> u8 {
        pitch_to_midi(self.step, self.alter, self.octave)
    }

    /// Chromatic position in semitones without clamping, C-1 = 0
    pub fn ps(&self) -> i32 {
        step_semitones(self.step) + self.alter as i32 + (self.octave as i32 + 1) * 12
    }

    /// Pitch class 0-11 (C = 0)
    pub fn pitch_class(&self) -> u8 {
        self.ps().rem_euclid(12) as u8
    }

    /// Spelled name without octave, e.g. `C`, `F#`, `Bb`, `Ebb`
    pub fn name(&self) -> String {
        let mut name = String::with_capacity(3);
        name.push(self.step);
        name.push_str(&accidental_suffix(self.alter));
        name
    }

    /// Spelled name with octave, e.g. `F#4`
    pub fn name_with_octave(&self) -> String {
        format!("{}{}", self.name(), self.octave)
    }

    /// Signed semitone distance from `self` up to `other`
    pub fn semitones_to(&self, other: &Pitch) -> i32 {
        other.ps() - self.ps()
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name_with_octave())
    }
}

impl PartialOrd for Pitch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Orders by sounding height, then by diatonic spelling
impl Ord for Pitch {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ps()
            .cmp(&other.ps())
            .then_with(|| diatonic_index(self).cmp(&diatonic_index(other)))
    }
}

fn diatonic_index(pitch: &Pitch) -> i32 {
    let step = match pitch.step {
        'C' => 0,
        'D' => 1,
        'E' => 2,
        'F' => 3,
        'G' => 4,
        'A' => 5,
        'B' => 6,
        _ => 0,
    };
    pitch.octave as i32 * 7 + step
}

fn step_semitones(step: char) -> i32 {
    match step {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => 0,
    }
}

fn accidental_suffix(alter: i8) -> String {
    match alter {
        0 => String::new(),
        a if a > 0 => "#".repeat(a as usize),
        a => "b".repeat(a.unsigned_abs() as usize),
    }
}

/// Convert MusicXML pitch representation to MIDI note number
///
/// # Arguments
/// * `step` - Note letter (C, D, E, F, G, A, B)
/// * `alter` - Semitone alteration (-2 = double flat, -1 = flat, 0 = natural, 1 = sharp, 2 = double sharp)
/// * `octave` - Octave number (C4 = middle C)
///
/// # Returns
/// MIDI note number (0-127, where 60 = C4)
pub fn pitch_to_midi(step: char, alter: i8, octave: i8) -> u8 {
    let semi = step_semitones(step) + alter as i32 + (octave as i32 + 1) * 12;
    semi.clamp(0, 127) as u8
}
