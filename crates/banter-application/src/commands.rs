//! Saved-command tracking.
//!
//! Remembers prompts the user reuses and ranks them by use count, backed by
//! the `commands` collection and its `by-use-count` index.

use std::sync::Arc;

use banter_core::command::StoredCommand;
use banter_core::error::{BanterError, Result};
use banter_core::repository::CommandRepository;

pub struct CommandTracker {
    commands: Arc<dyn CommandRepository>,
}

impl CommandTracker {
    pub fn new(commands: Arc<dyn CommandRepository>) -> Self {
        Self { commands }
    }

    /// Records one use of `content`, creating the command on first use and
    /// bumping its count afterwards.
    pub async fn record_use(&self, content: &str) -> Result<StoredCommand> {
        let content = content.trim();
        if content.is_empty() {
            return Err(BanterError::precondition("command content is empty"));
        }

        let command = match self.commands.find_by_content(content).await? {
            Some(mut existing) => {
                existing.use_count += 1;
                existing
            }
            None => StoredCommand::new(content),
        };
        self.commands.save(&command).await?;
        Ok(command)
    }

    /// The most-used commands, best first.
    pub async fn frequent(&self, limit: usize) -> Result<Vec<StoredCommand>> {
        let mut commands = self.commands.list_by_use_count().await?;
        commands.truncate(limit);
        Ok(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banter_infrastructure::chat_schema;
    use banter_infrastructure::document_store::DocumentStore;
    use banter_infrastructure::repositories::StoreCommandRepository;
    use tempfile::TempDir;

    async fn tracker_in(dir: &TempDir) -> CommandTracker {
        let store = Arc::new(DocumentStore::open(dir.path(), &chat_schema()).await.unwrap());
        CommandTracker::new(Arc::new(StoreCommandRepository::new(store)))
    }

    #[tokio::test]
    async fn repeated_use_bumps_the_count_in_place() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker_in(&dir).await;

        let first = tracker.record_use("summarize this").await.unwrap();
        assert_eq!(first.use_count, 1);

        let second = tracker.record_use("summarize this").await.unwrap();
        assert_eq!(second.use_count, 2);
        assert_eq!(second.id, first.id);
    }

    #[tokio::test]
    async fn frequent_ranks_by_use_count() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker_in(&dir).await;

        tracker.record_use("rare").await.unwrap();
        for _ in 0..3 {
            tracker.record_use("common").await.unwrap();
        }

        let ranked = tracker.frequent(10).await.unwrap();
        assert_eq!(ranked[0].content, "common");
        assert_eq!(ranked[0].use_count, 3);
        assert_eq!(ranked[1].content, "rare");

        let top_one = tracker.frequent(1).await.unwrap();
        assert_eq!(top_one.len(), 1);
    }

    #[tokio::test]
    async fn blank_content_is_rejected() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker_in(&dir).await;
        assert!(tracker.record_use("   ").await.unwrap_err().is_precondition());
    }
}
