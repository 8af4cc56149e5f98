//! Unrolling repeats, voltas and D.C./D.S. jumps into performance order
//!
//! All parts of a score share one play order, computed from the union of the
//! marks written in any part (navigation words are often only engraved in the
//! top staff).

use thiserror::Error;

use crate::models::{Measure, Part, RepeatMarks, Score};

/// Expansion gives up once a part grows past this many times its written length
const MAX_EXPANSION_FACTOR: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    #[error("ending in measure {0} lists no numbers")]
    EmptyEnding(String),

    #[error("D.S. in measure {0} but the score has no segno")]
    MissingSegno(String),

    #[error("To Coda in measure {0} but no coda follows")]
    MissingCoda(String),

    #[error("repeat structure does not end within {0} measures")]
    Runaway(usize),

    #[error("part '{0}' is too long to time once unrolled")]
    TooLong(String),

    #[error("part '{part}' has {found} measures, expected {expected}")]
    PartMismatch {
        part: String,
        found: usize,
        expected: usize,
    },
}

/// Return a copy of `score` with every part in performance order.
///
/// Measures keep their written number; their repeat marks are cleared.
pub fn expand_score(score: &Score) -> Result<Score, ExpandError> {
    let expected = score.parts.first().map(|p| p.measures.len()).unwrap_or(0);
    if let Some(part) = score.parts.iter().find(|p| p.measures.len() != expected) {
        return Err(ExpandError::PartMismatch {
            part: part.name.clone(),
            found: part.measures.len(),
            expected,
        });
    }

    let marks = merged_marks(&score.parts, expected);
    let numbers: Vec<&str> = score
        .parts
        .first()
        .map(|p| p.measures.iter().map(|m| m.number.as_str()).collect())
        .unwrap_or_default();
    let order = play_order(&marks, &numbers)?;

    if order.len() != expected {
        log::debug!(
            "{}: {} written measure(s) unrolled to {}",
            score.name,
            expected,
            order.len()
        );
    }

    let parts: Vec<Part> = score
        .parts
        .iter()
        .map(|part| Part {
            id: part.id.clone(),
            name: part.name.clone(),
            instrument: part.instrument.clone(),
            measures: order
                .iter()
                .map(|&idx| Measure {
                    repeat: RepeatMarks::default(),
                    ..part.measures[idx].clone()
                })
                .collect(),
        })
        .collect();
    if let Some(part) = parts.iter().find(|p| p.checked_length().is_none()) {
        return Err(ExpandError::TooLong(part.name.clone()));
    }

    Ok(Score {
        name: score.name.clone(),
        title: score.title.clone(),
        composer: score.composer.clone(),
        parts,
    })
}

fn merged_marks(parts: &[Part], count: usize) -> Vec<RepeatMarks> {
    (0..count)
        .map(|idx| {
            let mut merged = RepeatMarks::default();
            for marks in parts.iter().map(|p| &p.measures[idx].repeat) {
                merged.forward |= marks.forward;
                merged.backward = merged.backward.max(marks.backward);
                if merged.ending.is_none() {
                    merged.ending = marks.ending.clone();
                }
                merged.segno |= marks.segno;
                merged.coda |= marks.coda;
                merged.fine |= marks.fine;
                merged.da_capo |= marks.da_capo;
                merged.dal_segno |= marks.dal_segno;
                merged.to_coda |= marks.to_coda;
            }
            merged
        })
        .collect()
}

/// Indices of the written measures in the order they are played
fn play_order(marks: &[RepeatMarks], numbers: &[&str]) -> Result<Vec<usize>, ExpandError> {
    let label = |idx: usize| {
        numbers
            .get(idx)
            .filter(|n| !n.is_empty())
            .map(|n| n.to_string())
            .unwrap_or_else(|| (idx + 1).to_string())
    };

    if let Some(idx) = marks
        .iter()
        .position(|m| matches!(&m.ending, Some(numbers) if numbers.is_empty()))
    {
        return Err(ExpandError::EmptyEnding(label(idx)));
    }

    let limit = marks.len() * MAX_EXPANSION_FACTOR;
    let mut order = Vec::with_capacity(marks.len());
    let mut idx = 0;
    let mut section_start = 0;
    let mut pass = 1u32;
    let mut furthest_backward: Option<usize> = None;
    let mut jumped = false;

    while idx < marks.len() {
        if order.len() > limit {
            return Err(ExpandError::Runaway(limit));
        }
        let current = &marks[idx];

        if !jumped {
            // First measure past a finished section starts a new one
            if current.ending.is_none() && furthest_backward.is_some_and(|b| idx > b) {
                section_start = idx;
                pass = 1;
                furthest_backward = None;
            }
            if current.forward && idx != section_start {
                section_start = idx;
                pass = 1;
            }
        }

        if let Some(endings) = &current.ending {
            let wanted = if jumped {
                ending_group_max(marks, idx)
            } else {
                pass
            };
            if !endings.contains(&wanted) {
                idx += 1;
                continue;
            }
        }

        order.push(idx);

        if let (Some(times), false) = (current.backward, jumped) {
            let times = if current.ending.is_some() {
                times.max(ending_group_max(marks, idx))
            } else {
                times
            };
            furthest_backward = Some(furthest_backward.map_or(idx, |b| b.max(idx)));
            if pass < times {
                pass += 1;
                idx = section_start;
                continue;
            }
        }

        if jumped {
            if current.fine {
                break;
            }
            if current.to_coda {
                idx = (idx + 1..marks.len())
                    .find(|&i| marks[i].coda)
                    .ok_or_else(|| ExpandError::MissingCoda(label(idx)))?;
                continue;
            }
        } else if current.has_jump() {
            jumped = true;
            pass = 1;
            idx = if current.dal_segno {
                marks
                    .iter()
                    .position(|m| m.segno)
                    .ok_or_else(|| ExpandError::MissingSegno(label(idx)))?
            } else {
                0
            };
            continue;
        }

        idx += 1;
    }

    Ok(order)
}

/// Highest volta number in the run of ending measures around `idx`
fn ending_group_max(marks: &[RepeatMarks], idx: usize) -> u32 {
    let start = marks[..idx]
        .iter()
        .rposition(|m| m.ending.is_none())
        .map_or(0, |p| p + 1);
    let end = marks[idx..]
        .iter()
        .position(|m| m.ending.is_none())
        .map_or(marks.len(), |p| idx + p);
    marks[start..end]
        .iter()
        .filter_map(|m| m.ending.as_ref())
        .flatten()
        .copied()
        .max()
        .unwrap_or(1)
}
