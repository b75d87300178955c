//! Storage layer for Banter.
//!
//! Provides the embedded document store (versioned, keyed, recoverable), the
//! chat schema, the typed repository implementations, application paths, and
//! the flat preferences file.

pub mod document_store;
pub mod paths;
pub mod prefs;
pub mod repositories;
pub mod schema;

pub use document_store::{
    CollectionSpec, DocumentStore, IndexSpec, MigrationStep, Schema, StoreOpener,
};
pub use paths::BanterPaths;
pub use prefs::PrefsFile;
pub use repositories::{
    StoreCommandRepository, StoreConfigRepository, StoreSessionRepository, StoreUserRepository,
};
pub use schema::{SCHEMA_VERSION, STORE_NAME, chat_schema};
