//! Store schema for the chat database.
//!
//! The version history mirrors the deployed databases this code must be able
//! to open in place:
//! - **1**: `sessions`, `messages`, and `commands` with their indexes
//! - **2**: the singleton `config` record
//! - **3**: `users` keyed by username

use crate::document_store::{CollectionSpec, IndexSpec, MigrationStep, Schema};

/// Name of the chat store directory.
pub const STORE_NAME: &str = "banter-chat";

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 3;

/// Collection names.
pub mod collections {
    pub const SESSIONS: &str = "sessions";
    pub const MESSAGES: &str = "messages";
    pub const COMMANDS: &str = "commands";
    pub const CONFIG: &str = "config";
    pub const USERS: &str = "users";
}

/// Secondary index names.
pub mod indexes {
    pub const BY_LAST_UPDATED: &str = "by-last-updated";
    pub const BY_SESSION: &str = "sessionId";
    pub const BY_USE_COUNT: &str = "by-use-count";
}

const STEP_ONE: &[CollectionSpec] = &[
    CollectionSpec {
        name: collections::SESSIONS,
        key_path: "id",
        index: Some(IndexSpec {
            name: indexes::BY_LAST_UPDATED,
            field: "lastUpdated",
        }),
    },
    // Reserved for message normalization; nothing reads it yet.
    CollectionSpec {
        name: collections::MESSAGES,
        key_path: "id",
        index: Some(IndexSpec {
            name: indexes::BY_SESSION,
            field: "sessionId",
        }),
    },
    CollectionSpec {
        name: collections::COMMANDS,
        key_path: "id",
        index: Some(IndexSpec {
            name: indexes::BY_USE_COUNT,
            field: "useCount",
        }),
    },
];

const STEP_TWO: &[CollectionSpec] = &[CollectionSpec {
    name: collections::CONFIG,
    key_path: "id",
    index: None,
}];

const STEP_THREE: &[CollectionSpec] = &[CollectionSpec {
    name: collections::USERS,
    key_path: "username",
    index: None,
}];

/// Builds the chat store schema at the current version.
pub fn chat_schema() -> Schema {
    Schema {
        name: STORE_NAME,
        version: SCHEMA_VERSION,
        steps: vec![
            MigrationStep {
                version: 1,
                collections: STEP_ONE,
            },
            MigrationStep {
                version: 2,
                collections: STEP_TWO,
            },
            MigrationStep {
                version: 3,
                collections: STEP_THREE,
            },
        ],
    }
}
