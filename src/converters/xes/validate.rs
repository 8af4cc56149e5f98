use std::path::Path;

use roxmltree::{Document, Node};

use super::{Result, XesError};
use crate::models::EventLog;

/// Read a written XES document back and check it against the log it came from.
///
/// Checks that every trace is named after one of the log's cases, that each
/// trace holds `base events × lifecycles` events, and that every event carries
/// `concept:name` and `time:timestamp`.
pub fn validate_xes(xml: &str, expected: &EventLog) -> Result<()> {
    let doc = Document::parse(xml).map_err(|e| XesError::Invalid(e.to_string()))?;
    let root = doc.root_element();
    if root.tag_name().name() != "log" {
        return Err(XesError::Invalid(format!(
            "root element is <{}>, expected <log>",
            root.tag_name().name()
        )));
    }

    let traces: Vec<Node> = root.children().filter(|n| n.has_tag_name("trace")).collect();
    if traces.len() != expected.traces.len() {
        return Err(XesError::Invalid(format!(
            "{} trace(s) written, {} expected",
            traces.len(),
            expected.traces.len()
        )));
    }

    for node in traces {
        let case_id = attribute_value(node, "string", "concept:name")
            .ok_or_else(|| XesError::Invalid("trace without concept:name".to_string()))?;
        let trace = expected
            .traces
            .iter()
            .find(|t| t.case_id == case_id)
            .ok_or_else(|| XesError::Invalid(format!("unexpected trace '{}'", case_id)))?;

        let events: Vec<Node> = node.children().filter(|n| n.has_tag_name("event")).collect();
        let wanted = trace.base_event_count * expected.lifecycle_count;
        if events.len() != wanted {
            return Err(XesError::Invalid(format!(
                "trace '{}' has {} event(s), expected {}",
                case_id,
                events.len(),
                wanted
            )));
        }

        for (idx, event) in events.iter().enumerate() {
            if attribute_value(*event, "string", "concept:name").is_none() {
                return Err(XesError::Invalid(format!(
                    "event {} of trace '{}' has no concept:name",
                    idx, case_id
                )));
            }
            if attribute_value(*event, "date", "time:timestamp").is_none() {
                return Err(XesError::Invalid(format!(
                    "event {} of trace '{}' has no time:timestamp",
                    idx, case_id
                )));
            }
        }
    }

    Ok(())
}

pub fn validate_xes_file(path: &Path, expected: &EventLog) -> Result<()> {
    let xml = std::fs::read_to_string(path)?;
    validate_xes(&xml, expected)
}

/// Value of the direct child `<tag key="key" value="..."/>` of `node`
fn attribute_value<'a>(node: Node<'a, '_>, tag: &str, key: &str) -> Option<&'a str> {
    node.children()
        .find(|n| n.tag_name().name() == tag && n.attribute("key") == Some(key))
        .and_then(|n| n.attribute("value"))
}
