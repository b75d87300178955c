//! Identifier and timestamp helpers.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use uuid::Uuid;

static TIMESTAMP_ID_SEQ: AtomicU64 = AtomicU64::new(0);

/// Allocates a fresh session identifier.
pub fn session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Allocates a timestamp-derived identifier for messages and commands.
///
/// The process-wide sequence suffix keeps two identifiers minted within the
/// same millisecond distinct, which a bare timestamp cannot guarantee when a
/// user turn and the model reply land in the same tick.
pub fn timestamp_id() -> String {
    let seq = TIMESTAMP_ID_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}", now_millis(), seq)
}

/// Current wall-clock time as epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn timestamp_ids_are_unique_within_a_tick() {
        let ids: HashSet<String> = (0..1000).map(|_| timestamp_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn session_ids_parse_as_uuids() {
        assert!(Uuid::parse_str(&session_id()).is_ok());
    }
}
