//! Harmony-shift events: runs of measures sharing an estimated key

use super::{LogicalEvent, PartView};
use crate::analysis::{add_measure_weights, KeyAnalyzer, PitchClassWeights};
use crate::models::{AttributeValue, EventType, QuarterLength};

/// Harmony segments of a case with the default three-measure window
pub fn harmony_events(views: &[PartView]) -> Vec<LogicalEvent> {
    harmony_events_with(views, &KeyAnalyzer::default())
}

/// One event per run of consecutive measures with the same local key.
///
/// Keys are estimated over all parts of the case together. The label is the
/// key name; `scale_degree` places its tonic in the scale of the global key.
pub fn harmony_events_with(views: &[PartView], analyzer: &KeyAnalyzer) -> Vec<LogicalEvent> {
    // Expanded parts share one measure order; the lead part gives the spans
    let Some(lead) = views.first() else {
        return Vec::new();
    };
    let spans: Vec<(QuarterLength, QuarterLength)> = lead
        .part
        .measures_with_offsets()
        .map(|(start, measure)| (start, start + measure.duration))
        .collect();

    let mut weights: Vec<PitchClassWeights> = vec![[0.0; 12]; spans.len()];
    for view in views {
        for (total, measure) in weights.iter_mut().zip(&view.part.measures) {
            add_measure_weights(total, measure);
        }
    }

    let Some(global) = analyzer.global_key(&weights) else {
        log::debug!("no pitched notes, no harmony events");
        return Vec::new();
    };
    let local = analyzer.local_keys(&weights, global);

    let mut events = Vec::new();
    let mut segment_start = 0;
    for idx in 1..=local.len() {
        if idx < local.len() && local[idx] == local[segment_start] {
            continue;
        }
        let key = local[segment_start];
        let mut attributes = vec![
            (
                "scale_degree".to_string(),
                AttributeValue::Float(global.scale_degree(key.tonic)),
            ),
            ("mode".to_string(), key.mode.as_str().into()),
        ];
        if let [view] = views {
            attributes.push(("Part".to_string(), view.label.into()));
        }
        events.push(LogicalEvent {
            activity: key.to_string(),
            event_type: EventType::HarmonicShift,
            onset: spans[segment_start].0,
            end: spans[idx - 1].1,
            measure: segment_start + 1,
            attributes,
        });
        segment_start = idx;
    }
    events
}
