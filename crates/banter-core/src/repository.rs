//! Repository traits.
//!
//! These traits define the persistence contract the application layer depends
//! on, decoupling it from the embedded document store implementation.

use async_trait::async_trait;

use crate::command::StoredCommand;
use crate::config::ChatConfig;
use crate::error::Result;
use crate::session::Session;
use crate::user::UserRecord;

/// Persistence operations for sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Lists all stored sessions in primary-key order.
    async fn list_all(&self) -> Result<Vec<Session>>;

    /// Inserts a new session.
    ///
    /// # Errors
    ///
    /// Fails with `DuplicateKey` if a session with the same id already
    /// exists; a duplicate here indicates a bug in the caller.
    async fn insert(&self, session: &Session) -> Result<()>;

    /// Saves a session, replacing any previous record with the same id.
    async fn save(&self, session: &Session) -> Result<()>;

    /// Deletes a session. Deleting an absent id is not an error.
    async fn delete(&self, session_id: &str) -> Result<()>;
}

/// Persistence operations for the singleton configuration record.
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    async fn load(&self) -> Result<Option<ChatConfig>>;
    async fn save(&self, config: &ChatConfig) -> Result<()>;
}

/// Persistence operations for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find(&self, username: &str) -> Result<Option<UserRecord>>;
    async fn create(&self, user: &UserRecord) -> Result<()>;
}

/// Persistence operations for saved commands.
#[async_trait]
pub trait CommandRepository: Send + Sync {
    /// Finds a command whose content matches exactly.
    async fn find_by_content(&self, content: &str) -> Result<Option<StoredCommand>>;

    /// Inserts or replaces a command record.
    async fn save(&self, command: &StoredCommand) -> Result<()>;

    /// Lists commands ordered by descending use count.
    async fn list_by_use_count(&self) -> Result<Vec<StoredCommand>>;
}
