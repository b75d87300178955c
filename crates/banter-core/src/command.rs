//! Saved command records.

use serde::{Deserialize, Serialize};

use crate::ids;

/// A saved prompt with usage tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCommand {
    pub id: String,
    pub content: String,
    /// Creation time as epoch milliseconds.
    pub timestamp: i64,
    /// How many times the command has been reused.
    pub use_count: u32,
}

impl StoredCommand {
    /// Creates a record for a first use of `content`.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: ids::timestamp_id(),
            content: content.into(),
            timestamp: ids::now_millis(),
            use_count: 1,
        }
    }
}
