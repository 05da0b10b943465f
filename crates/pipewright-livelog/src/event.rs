//! Execution log events.
//!
//! Events arrive from an executor as `{"type": "...", "message": "..."}`,
//! one per line of output or status change. Arrival order is the only
//! sequence they carry.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
  Info,
  Success,
  Error,
  /// Raw command output.
  Output,
  /// Any type this consumer does not know, including a missing or
  /// non-string `type`. Rendered as info.
  #[default]
  #[serde(other)]
  Unknown,
}

impl LogKind {
  /// Success and error end the step currently in flight.
  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Success | Self::Error)
  }
}

/// One event of the execution event channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
  #[serde(rename = "type", default, deserialize_with = "lenient_kind")]
  pub kind: LogKind,
  #[serde(default, deserialize_with = "lenient_message")]
  pub message: String,
}

fn lenient_kind<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LogKind, D::Error> {
  Ok(match Value::deserialize(deserializer)? {
    Value::String(tag) => serde_json::from_value(Value::String(tag)).unwrap_or_default(),
    _ => LogKind::Unknown,
  })
}

/// Strings pass through, null is empty, anything else is shown as JSON.
fn lenient_message<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
  Ok(match Value::deserialize(deserializer)? {
    Value::String(message) => message,
    Value::Null => String::new(),
    other => other.to_string(),
  })
}

impl LogEvent {
  pub fn new(kind: LogKind, message: impl Into<String>) -> Self {
    Self {
      kind,
      message: message.into(),
    }
  }

  pub fn info(message: impl Into<String>) -> Self {
    Self::new(LogKind::Info, message)
  }

  pub fn success(message: impl Into<String>) -> Self {
    Self::new(LogKind::Success, message)
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self::new(LogKind::Error, message)
  }

  pub fn output(message: impl Into<String>) -> Self {
    Self::new(LogKind::Output, message)
  }

  /// Parse one JSON-encoded event.
  pub fn from_json(line: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(line)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_wire_event() {
    let event = LogEvent::from_json(r#"{"type": "output", "message": "hi\n"}"#).unwrap();
    assert_eq!(event, LogEvent::output("hi\n"));
  }

  #[test]
  fn test_unknown_type_parses() {
    let event = LogEvent::from_json(r#"{"type": "warning", "message": "slow"}"#).unwrap();
    assert_eq!(event.kind, LogKind::Unknown);
    assert_eq!(event.message, "slow");
  }

  #[test]
  fn test_missing_or_odd_type_is_unknown() {
    for line in [
      r#"{"message": "no type"}"#,
      r#"{"type": null, "message": "no type"}"#,
      r#"{"type": 5, "message": "no type"}"#,
      r#"{"type": ["info"], "message": "no type"}"#,
    ] {
      let event = LogEvent::from_json(line).unwrap();
      assert_eq!(event.kind, LogKind::Unknown, "{}", line);
      assert_eq!(event.message, "no type", "{}", line);
    }
  }

  #[test]
  fn test_non_string_message_is_kept() {
    let event = LogEvent::from_json(r#"{"type": "info", "message": 42}"#).unwrap();
    assert_eq!(event, LogEvent::info("42"));

    let event = LogEvent::from_json(r#"{"type": "error", "message": null}"#).unwrap();
    assert_eq!(event, LogEvent::error(""));

    let event = LogEvent::from_json(r#"{"type": "output", "message": {"rc": 1}}"#).unwrap();
    assert_eq!(event.message, r#"{"rc":1}"#);
  }

  #[test]
  fn test_non_object_is_error() {
    assert!(LogEvent::from_json("not json").is_err());
    assert!(LogEvent::from_json(r#""just a string""#).is_err());
  }

  #[test]
  fn test_serialize_uses_type_key() {
    let value = serde_json::to_value(LogEvent::success("done")).unwrap();
    assert_eq!(value, serde_json::json!({"type": "success", "message": "done"}));
  }
}
