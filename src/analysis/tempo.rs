//! Mapping score offsets to wall-clock timestamps

use chrono::{DateTime, TimeZone, Utc};
use num_traits::{CheckedAdd, CheckedSub};

use crate::models::{QuarterLength, Score};

/// Quarter notes per minute assumed before the first tempo mark
pub const DEFAULT_TEMPO: f64 = 80.0;

/// Offset zero of every piece: 2024-01-01T00:00:00Z, in Unix milliseconds
pub const LOG_EPOCH_MILLIS: i64 = 1_704_067_200_000;

/// Score-wide tempo changes, sorted by offset
#[derive(Debug, Clone, PartialEq)]
pub struct TempoMap {
    changes: Vec<(QuarterLength, f64)>,
}

impl TempoMap {
    pub fn new(mut changes: Vec<(QuarterLength, f64)>) -> Self {
        changes.retain(|(_, bpm)| bpm.is_finite() && *bpm > 0.0);
        changes.sort_by(|a, b| a.0.cmp(&b.0));
        // Several parts usually repeat the same mark; first one wins
        changes.dedup_by(|later, earlier| later.0 == earlier.0);
        Self { changes }
    }

    /// Collect the tempo marks of all parts of an (expanded) score
    pub fn from_score(score: &Score) -> Self {
        let changes = score
            .parts
            .iter()
            .flat_map(|part| {
                part.measures_with_offsets().flat_map(|(start, measure)| {
                    measure
                        .tempo_changes
                        .iter()
                        .filter_map(move |(offset, bpm)| Some((start.checked_add(offset)?, *bpm)))
                })
            })
            .collect();
        Self::new(changes)
    }

    /// Seconds elapsed from offset zero to `offset`
    pub fn seconds_at(&self, offset: QuarterLength) -> f64 {
        let mut seconds = 0.0;
        let mut position = QuarterLength::from_integer(0);
        let mut bpm = DEFAULT_TEMPO;

        for &(change_at, change_bpm) in &self.changes {
            if change_at >= offset {
                break;
            }
            if change_at > position {
                seconds += span(position, change_at) * 60.0 / bpm;
                position = change_at;
            }
            bpm = change_bpm;
        }
        if offset > position {
            seconds += span(position, offset) * 60.0 / bpm;
        }
        seconds
    }

    /// Timestamp of `offset`, rounded to the millisecond
    pub fn timestamp(&self, offset: QuarterLength) -> DateTime<Utc> {
        let millis = (self.seconds_at(offset) * 1000.0).round() as i64;
        Utc.timestamp_millis_opt(LOG_EPOCH_MILLIS + millis)
            .single()
            .unwrap_or_default()
    }
}

fn quarters(length: QuarterLength) -> f64 {
    *length.numer() as f64 / *length.denom() as f64
}

/// Quarters from `from` to `to`; falls back to floats when the exact
/// difference does not fit
fn span(from: QuarterLength, to: QuarterLength) -> f64 {
    to.checked_sub(&from)
        .map(quarters)
        .unwrap_or_else(|| quarters(to) - quarters(from))
}
