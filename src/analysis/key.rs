//! Key estimation from pitch-class durations
//!
//! Each measure gets the key that best correlates (Pearson) with the
//! duration-weighted pitch-class histogram of a window of measures starting
//! at it, using the Aarden-Essen major/minor profiles.

use crate::models::{Key, Measure, Mode};

/// Aarden-Essen major key profile, tonic first
pub const AARDEN_ESSEN_MAJOR: [f64; 12] = [
    17.7661, 0.145624, 14.9265, 0.160186, 19.8049, 11.3587, 0.291248, 22.062, 0.145624, 8.15494,
    0.232998, 4.95122,
];

/// Aarden-Essen minor key profile, tonic first
pub const AARDEN_ESSEN_MINOR: [f64; 12] = [
    18.2648, 0.737619, 14.0499, 16.8599, 0.702494, 14.4362, 0.702494, 18.6161, 4.56621, 1.93186,
    7.37619, 1.75623,
];

/// Duration in quarter notes per pitch class (C = 0)
pub type PitchClassWeights = [f64; 12];

/// Add the sounding pitches of `measure` to `weights`, each weighted by its duration
pub fn add_measure_weights(weights: &mut PitchClassWeights, measure: &Measure) {
    for element in &measure.elements {
        let duration = *element.duration.numer() as f64 / *element.duration.denom() as f64;
        for pitch in element.pitches() {
            weights[pitch.pitch_class() as usize] += duration;
        }
    }
}

/// Best-matching key for `weights`, or `None` when nothing sounds.
///
/// Candidates are tried tonic by tonic from C, major before minor; the first
/// of equally good keys wins.
pub fn estimate_key(weights: &PitchClassWeights) -> Option<Key> {
    if weights.iter().all(|&w| w <= 0.0) {
        return None;
    }

    let mut best: Option<(f64, Key)> = None;
    for tonic in 0..12u8 {
        for (mode, profile) in [(Mode::Major, &AARDEN_ESSEN_MAJOR), (Mode::Minor, &AARDEN_ESSEN_MINOR)] {
            let rotated: PitchClassWeights =
                std::array::from_fn(|pc| profile[(pc + 12 - tonic as usize) % 12]);
            let score = correlation(weights, &rotated);
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, Key::new(tonic, mode)));
            }
        }
    }
    best.map(|(_, key)| key)
}

fn correlation(a: &PitchClassWeights, b: &PitchClassWeights) -> f64 {
    let mean_a = a.iter().sum::<f64>() / 12.0;
    let mean_b = b.iter().sum::<f64>() / 12.0;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        cov += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }
    if var_a == 0.0 || var_b == 0.0 {
        return 0.0;
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}

/// Windowed key estimation over a sequence of measures
#[derive(Debug, Clone, Copy)]
pub struct KeyAnalyzer {
    window: usize,
}

impl Default for KeyAnalyzer {
    fn default() -> Self {
        Self { window: 3 }
    }
}

impl KeyAnalyzer {
    pub fn new(window: usize) -> Self {
        Self { window: window.max(1) }
    }

    /// Key of the whole sequence
    pub fn global_key(&self, measure_weights: &[PitchClassWeights]) -> Option<Key> {
        estimate_key(&sum_weights(measure_weights))
    }

    /// Local key of every measure, estimated over measures `i..i + window`
    /// (the measure and the two after it by default).
    ///
    /// Measures whose window is silent take the previous measure's key, or
    /// `fallback` when no earlier measure has one.
    pub fn local_keys(&self, measure_weights: &[PitchClassWeights], fallback: Key) -> Vec<Key> {
        let mut previous = fallback;
        (0..measure_weights.len())
            .map(|idx| {
                let end = (idx + self.window).min(measure_weights.len());
                if let Some(key) = estimate_key(&sum_weights(&measure_weights[idx..end])) {
                    previous = key;
                }
                previous
            })
            .collect()
    }
}

fn sum_weights(measure_weights: &[PitchClassWeights]) -> PitchClassWeights {
    measure_weights.iter().fold([0.0; 12], |mut acc, weights| {
        for (total, w) in acc.iter_mut().zip(weights) {
            *total += w;
        }
        acc
    })
}
