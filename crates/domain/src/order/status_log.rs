//! Append-only status log owned by an order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry in an order's status log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    /// Event name, e.g. `"paid"` or `"payment_failed"`.
    pub event: String,

    /// When the transition happened.
    pub timestamp: DateTime<Utc>,

    /// Free-form payload recorded with the transition.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

/// Ordered history of state-machine transitions on an order.
///
/// Entries can only be appended, never rewritten or removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusLog {
    entries: Vec<StatusEntry>,
}

impl StatusLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry with the current timestamp.
    pub fn append(&mut self, event: impl Into<String>, payload: serde_json::Value) {
        self.entries.push(StatusEntry {
            event: event.into(),
            timestamp: Utc::now(),
            payload,
        });
    }

    /// Returns all entries in append order.
    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    /// Returns true if the log contains an entry with the given event name.
    pub fn contains(&self, event: &str) -> bool {
        self.entries.iter().any(|e| e.event == event)
    }

    /// Returns the number of entries with the given event name.
    pub fn count(&self, event: &str) -> usize {
        self.entries.iter().filter(|e| e.event == event).count()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the log has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut log = StatusLog::new();
        log.append("paid", serde_json::json!({ "gateway": "dummy" }));
        log.append("refunded", serde_json::Value::Null);

        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].event, "paid");
        assert_eq!(log.entries()[1].event, "refunded");
    }

    #[test]
    fn test_contains_and_count() {
        let mut log = StatusLog::new();
        assert!(!log.contains("paid"));

        log.append("paid", serde_json::Value::Null);
        assert!(log.contains("paid"));
        assert_eq!(log.count("paid"), 1);
        assert_eq!(log.count("refunded"), 0);
    }
}
