//! Event records and the well-known event names published by the core.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Published after the personality pipeline persisted a new trait set.
///
/// Payload: the updated trait set as a JSON object (`trait -> number`).
pub const PERSONALITY_UPDATED: &str = "personality:updated";

/// Published by the pipeline after classifying an incoming message.
///
/// Payload: `{ "emotion": <label>, "language": <code>, "text": <input> }`.
pub const EMOTION_DETECTED: &str = "emotion:detected";

/// A single published event, as kept in the diagnostic buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Free-form event name (e.g. `"personality:updated"`).
    pub name: String,
    /// Arbitrary JSON payload.
    pub payload: Value,
    /// Publish time in Unix epoch milliseconds.
    pub timestamp: i64,
}

impl Event {
    /// Create a new event stamped with the current time.
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_is_timestamped() {
        let before = Utc::now().timestamp_millis();
        let event = Event::new("ping", json!({"n": 1}));
        let after = Utc::now().timestamp_millis();
        assert_eq!(event.name, "ping");
        assert_eq!(event.payload["n"], 1);
        assert!(event.timestamp >= before && event.timestamp <= after);
    }

    #[test]
    fn test_event_serializes_flat() {
        let event = Event {
            name: PERSONALITY_UPDATED.to_string(),
            payload: json!({"warmth": 55.0}),
            timestamp: 42,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["name"], "personality:updated");
        assert_eq!(value["timestamp"], 42);
        assert_eq!(value["payload"]["warmth"], 55.0);
    }
}
