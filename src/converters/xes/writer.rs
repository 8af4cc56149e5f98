use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event as XmlEvent};
use quick_xml::Writer;

use super::{Result, XesError};
use crate::models::{AttributeValue, Event, EventLog, Trace};

/// (name, prefix, uri) of the standard extensions the log uses
const EXTENSIONS: [(&str, &str, &str); 3] = [
    ("Lifecycle", "lifecycle", "http://www.xes-standard.org/lifecycle.xesext"),
    ("Time", "time", "http://www.xes-standard.org/time.xesext"),
    ("Concept", "concept", "http://www.xes-standard.org/concept.xesext"),
];

/// Serialize `log` as XES into `out`
pub fn write_xes<W: Write>(log: &EventLog, out: W) -> Result<()> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);

    emit(&mut writer, XmlEvent::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("log");
    root.push_attribute(("xes.version", "1849-2016"));
    root.push_attribute(("xes.features", "nested-attributes"));
    root.push_attribute(("xmlns", "http://www.xes-standard.org/"));
    emit(&mut writer, XmlEvent::Start(root))?;

    for (name, prefix, uri) in EXTENSIONS {
        let mut extension = BytesStart::new("extension");
        extension.push_attribute(("name", name));
        extension.push_attribute(("prefix", prefix));
        extension.push_attribute(("uri", uri));
        emit(&mut writer, XmlEvent::Empty(extension))?;
    }

    write_classifier(&mut writer, "Activity", "concept:name")?;
    write_classifier(&mut writer, "Activity with lifecycle", "concept:name lifecycle:transition")?;

    write_attribute(&mut writer, "concept:name", &AttributeValue::String(log.name.clone()))?;
    for (key, value) in &log.attributes {
        write_attribute(&mut writer, key, value)?;
    }

    for trace in &log.traces {
        write_trace(&mut writer, trace)?;
    }

    emit(&mut writer, XmlEvent::End(BytesEnd::new("log")))?;
    Ok(())
}

/// Serialize `log` to an in-memory XES document
pub fn write_xes_string(log: &EventLog) -> Result<String> {
    let mut buffer = Vec::new();
    write_xes(log, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| XesError::Write(e.to_string()))
}

/// Write `log` to `path`, replacing any existing file
pub fn write_xes_file(log: &EventLog, path: &Path) -> Result<()> {
    let mut buffer = Vec::new();
    write_xes(log, &mut buffer)?;
    buffer.push(b'\n');
    std::fs::write(path, buffer)?;
    Ok(())
}

fn emit<W: Write>(writer: &mut Writer<W>, event: XmlEvent<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| XesError::Write(e.to_string()))
}

/// XES date format: ISO-8601 with milliseconds and explicit offset
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}

fn write_classifier<W: Write>(writer: &mut Writer<W>, name: &str, keys: &str) -> Result<()> {
    let mut classifier = BytesStart::new("classifier");
    classifier.push_attribute(("name", name));
    classifier.push_attribute(("keys", keys));
    emit(writer, XmlEvent::Empty(classifier))
}

fn write_trace<W: Write>(writer: &mut Writer<W>, trace: &Trace) -> Result<()> {
    emit(writer, XmlEvent::Start(BytesStart::new("trace")))?;

    write_attribute(writer, "concept:name", &AttributeValue::String(trace.case_id.clone()))?;
    for (key, value) in &trace.attributes {
        write_attribute(writer, key, value)?;
    }
    for event in &trace.events {
        write_event(writer, event)?;
    }

    emit(writer, XmlEvent::End(BytesEnd::new("trace")))
}

fn write_event<W: Write>(writer: &mut Writer<W>, event: &Event) -> Result<()> {
    emit(writer, XmlEvent::Start(BytesStart::new("event")))?;

    write_attribute(writer, "concept:name", &AttributeValue::String(event.activity.clone()))?;
    write_attribute(writer, "time:timestamp", &AttributeValue::Date(event.timestamp))?;
    write_attribute(
        writer,
        "lifecycle:transition",
        &AttributeValue::String(event.lifecycle.as_str().to_string()),
    )?;
    write_attribute(writer, "type", &AttributeValue::String(event.event_type.as_str().to_string()))?;
    write_attribute(writer, "id", &AttributeValue::Int(event.order_index as i64))?;
    write_attribute(writer, "measure", &AttributeValue::Int(event.measure as i64))?;
    for (key, value) in &event.attributes {
        write_attribute(writer, key, value)?;
    }

    emit(writer, XmlEvent::End(BytesEnd::new("event")))
}

fn write_attribute<W: Write>(writer: &mut Writer<W>, key: &str, value: &AttributeValue) -> Result<()> {
    let (tag, text) = match value {
        AttributeValue::String(s) => ("string", s.clone()),
        AttributeValue::Int(i) => ("int", i.to_string()),
        AttributeValue::Float(f) => ("float", f.to_string()),
        AttributeValue::Date(d) => ("date", format_timestamp(d)),
    };

    let mut element = BytesStart::new(tag);
    element.push_attribute(("key", key));
    element.push_attribute(("value", text.as_str()));
    emit(writer, XmlEvent::Empty(element))
}
