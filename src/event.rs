//! Hook events
//!
//! An event is whatever JSON object the agent writes to stdin. Nothing is
//! validated beyond "is an object"; unknown fields ride along untouched and
//! keep their original key order.

use crate::{NotifyError, Result};
use serde_json::{Map, Value};

/// One agent lifecycle event
pub type Event = Map<String, Value>;

/// Parse raw hook input into an event
///
/// Anything other than a JSON object (including valid JSON scalars or
/// arrays) is rejected.
pub fn parse_event(raw: &str) -> Result<Event> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(NotifyError::InvalidEvent(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

/// The event's `message` field, or `""` when absent or not a string
pub fn message_of(event: &Event) -> &str {
    event.get("message").and_then(Value::as_str).unwrap_or("")
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
