use std::fmt;

use super::tonic::Tonic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Major,
    Minor,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
        }
    }

    /// Semitone offsets of the scale degrees above the tonic (natural minor for minor keys)
    pub fn scale_intervals(&self) -> [u8; 7] {
        match self {
            Mode::Major => [0, 2, 4, 5, 7, 9, 11],
            Mode::Minor => [0, 2, 3, 5, 7, 8, 10],
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An estimated key: tonic pitch class plus mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub tonic: u8,
    pub mode: Mode,
}

impl Key {
    pub fn new(tonic: u8, mode: Mode) -> Self {
        Self { tonic: tonic % 12, mode }
    }

    pub fn tonic_name(&self) -> Tonic {
        Tonic::for_key(self.tonic, self.mode)
    }

    /// Scale degree of `pitch_class` in this key's scale.
    ///
    /// Pitch classes outside the scale get the degree below them plus one half,
    /// so the raised fourth of C major is 4.5 and Db is 1.5.
    pub fn scale_degree(&self, pitch_class: u8) -> f64 {
        let distance = (pitch_class % 12 + 12 - self.tonic) % 12;
        let intervals = self.mode.scale_intervals();
        match intervals.iter().position(|&i| i == distance) {
            Some(index) => (index + 1) as f64,
            None => intervals.iter().filter(|&&i| i < distance).count() as f64 + 0.5,
        }
    }
}

/// Major keys are written with an upper-case tonic, minor keys lower-case (`G major`, `f# minor`)
impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tonic = self.tonic_name().as_str();
        match self.mode {
            Mode::Major => write!(f, "{} major", tonic),
            Mode::Minor => write!(f, "{} minor", tonic.to_lowercase()),
        }
    }
}
