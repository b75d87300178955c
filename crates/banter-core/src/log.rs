//! In-process diagnostic log.
//!
//! The buffer lives for the process lifetime only and is never persisted.
//! It exists so that failures of detached work, like write-behind persistence,
//! have a place to surface that the UI can render.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::ids;

/// Severity of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One diagnostic entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: i64,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A bounded, thread-safe diagnostic buffer.
///
/// Oldest entries are dropped once the capacity is reached.
#[derive(Debug)]
pub struct LogBuffer {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// Appends an entry, evicting the oldest one when full.
    pub fn push(&self, level: LogLevel, message: impl Into<String>, details: Option<String>) {
        let entry = LogEntry {
            timestamp: ids::now_millis(),
            level,
            message: message.into(),
            details,
        };
        let mut entries = self.entries.lock().expect("log buffer poisoned");
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Returns a copy of the buffered entries in insertion order.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .expect("log buffer poisoned")
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("log buffer poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(512)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_snapshot_keep_order() {
        let buffer = LogBuffer::new(8);
        buffer.push(LogLevel::Info, "first", None);
        buffer.push(LogLevel::Error, "second", Some("details".to_string()));

        let entries = buffer.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].level, LogLevel::Error);
        assert_eq!(entries[1].details.as_deref(), Some("details"));
    }

    #[test]
    fn capacity_evicts_oldest() {
        let buffer = LogBuffer::new(2);
        buffer.push(LogLevel::Info, "a", None);
        buffer.push(LogLevel::Info, "b", None);
        buffer.push(LogLevel::Info, "c", None);

        let messages: Vec<String> = buffer.snapshot().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, ["b", "c"]);
    }
}
