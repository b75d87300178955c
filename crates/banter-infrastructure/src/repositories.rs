//! Document-store backed repository implementations.
//!
//! Thin typed adapters between the repository traits in `banter-core` and
//! the collection operations of the embedded document store.

use std::sync::Arc;

use async_trait::async_trait;

use banter_core::command::StoredCommand;
use banter_core::config::{CONFIG_KEY, ChatConfig};
use banter_core::error::Result;
use banter_core::repository::{
    CommandRepository, ConfigRepository, SessionRepository, UserRepository,
};
use banter_core::session::Session;
use banter_core::user::UserRecord;

use crate::document_store::DocumentStore;
use crate::schema::{collections, indexes};

/// Session persistence over the `sessions` collection.
pub struct StoreSessionRepository {
    store: Arc<DocumentStore>,
}

impl StoreSessionRepository {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SessionRepository for StoreSessionRepository {
    async fn list_all(&self) -> Result<Vec<Session>> {
        self.store.get_all(collections::SESSIONS).await
    }

    async fn insert(&self, session: &Session) -> Result<()> {
        self.store.add(collections::SESSIONS, session).await
    }

    async fn save(&self, session: &Session) -> Result<()> {
        self.store.put(collections::SESSIONS, session).await
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.store.delete(collections::SESSIONS, session_id).await
    }
}

/// Configuration persistence over the singleton `config` record.
pub struct StoreConfigRepository {
    store: Arc<DocumentStore>,
}

impl StoreConfigRepository {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ConfigRepository for StoreConfigRepository {
    async fn load(&self) -> Result<Option<ChatConfig>> {
        self.store.get(collections::CONFIG, CONFIG_KEY).await
    }

    async fn save(&self, config: &ChatConfig) -> Result<()> {
        self.store.put(collections::CONFIG, config).await
    }
}

/// Account persistence over the `users` collection.
pub struct StoreUserRepository {
    store: Arc<DocumentStore>,
}

impl StoreUserRepository {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserRepository for StoreUserRepository {
    async fn find(&self, username: &str) -> Result<Option<UserRecord>> {
        self.store.get(collections::USERS, username).await
    }

    async fn create(&self, user: &UserRecord) -> Result<()> {
        self.store.put(collections::USERS, user).await
    }
}

/// Saved-command persistence over the `commands` collection.
pub struct StoreCommandRepository {
    store: Arc<DocumentStore>,
}

impl StoreCommandRepository {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CommandRepository for StoreCommandRepository {
    async fn find_by_content(&self, content: &str) -> Result<Option<StoredCommand>> {
        let all: Vec<StoredCommand> = self.store.get_all(collections::COMMANDS).await?;
        Ok(all.into_iter().find(|c| c.content == content))
    }

    async fn save(&self, command: &StoredCommand) -> Result<()> {
        self.store.put(collections::COMMANDS, command).await
    }

    async fn list_by_use_count(&self) -> Result<Vec<StoredCommand>> {
        let mut commands: Vec<StoredCommand> = self
            .store
            .get_all_by_index(collections::COMMANDS, indexes::BY_USE_COUNT)
            .await?;
        commands.reverse();
        Ok(commands)
    }
}
