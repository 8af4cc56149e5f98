/// Spelled tonic a key is named after
///
/// One spelling per pitch class, except the two pitch classes whose major and
/// minor keys are conventionally spelled apart (Db major / c# minor,
/// Ab major / g# minor).

use super::key::Mode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tonic {
    C,
    Cs,
    Db,
    D,
    Eb,
    E,
    F,
    Fs,
    G,
    Gs,
    Ab,
    A,
    Bb,
    B,
}

impl Tonic {
    /// Convert tonic to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Tonic::C => "C",
            Tonic::Cs => "C#",
            Tonic::Db => "Db",
            Tonic::D => "D",
            Tonic::Eb => "Eb",
            Tonic::E => "E",
            Tonic::F => "F",
            Tonic::Fs => "F#",
            Tonic::G => "G",
            Tonic::Gs => "G#",
            Tonic::Ab => "Ab",
            Tonic::A => "A",
            Tonic::Bb => "Bb",
            Tonic::B => "B",
        }
    }

    /// Conventional spelling of a key's tonic for the given pitch class.
    ///
    /// Picks the spelling with the smaller key signature (Db major, c# minor);
    /// the six-accidental keys use F# major and eb minor.
    pub fn for_key(pitch_class: u8, mode: Mode) -> Tonic {
        match (pitch_class % 12, mode) {
            (0, _) => Tonic::C,
            (1, Mode::Major) => Tonic::Db,
            (1, Mode::Minor) => Tonic::Cs,
            (2, _) => Tonic::D,
            (3, _) => Tonic::Eb,
            (4, _) => Tonic::E,
            (5, _) => Tonic::F,
            (6, _) => Tonic::Fs,
            (7, _) => Tonic::G,
            (8, Mode::Major) => Tonic::Ab,
            (8, Mode::Minor) => Tonic::Gs,
            (9, _) => Tonic::A,
            (10, _) => Tonic::Bb,
            _ => Tonic::B,
        }
    }
}
