//! Event log model handed from the extractor to the XES writer

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle phase of an event (`lifecycle:transition` in XES)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Start,
    Complete,
}

impl Lifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Start => "start",
            Lifecycle::Complete => "complete",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lifecycle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "start" => Ok(Lifecycle::Start),
            "complete" => Ok(Lifecycle::Complete),
            _ => Err(format!("Invalid lifecycle: '{}'. Expected start or complete", s)),
        }
    }
}

/// What a single event stands for (`type` attribute in XES)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Pitch,
    Rest,
    Interval,
    Measure,
    HarmonicShift,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Pitch => "pitch",
            EventType::Rest => "rest",
            EventType::Interval => "interval",
            EventType::Measure => "measure",
            EventType::HarmonicShift => "harmonic_shift",
        }
    }
}

/// Typed attribute value; maps onto the XES attribute elements
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Int(i64),
    Float(f64),
    Date(DateTime<Utc>),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

/// Ordered key/value attributes; order is preserved in the written file
pub type Attributes = Vec<(String, AttributeValue)>;

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub activity: String,
    pub event_type: EventType,
    pub lifecycle: Lifecycle,
    pub timestamp: DateTime<Utc>,
    pub order_index: usize,
    pub measure: usize,
    pub attributes: Attributes,
}

impl Event {
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// One case of the log
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub case_id: String,
    pub attributes: Attributes,
    pub events: Vec<Event>,
    /// Logical events before lifecycle expansion
    pub base_event_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventLog {
    pub name: String,
    pub attributes: Attributes,
    pub traces: Vec<Trace>,
    pub lifecycle_count: usize,
}

impl EventLog {
    pub fn event_count(&self) -> usize {
        self.traces.iter().map(|t| t.events.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_from_str() {
        assert_eq!("start".parse::<Lifecycle>().unwrap(), Lifecycle::Start);
        assert_eq!(" Complete ".parse::<Lifecycle>().unwrap(), Lifecycle::Complete);
        assert!("resume".parse::<Lifecycle>().is_err());
    }

    #[test]
    fn test_lifecycle_orders_start_first() {
        let mut phases = vec![Lifecycle::Complete, Lifecycle::Start];
        phases.sort();
        assert_eq!(phases, vec![Lifecycle::Start, Lifecycle::Complete]);
    }
}
