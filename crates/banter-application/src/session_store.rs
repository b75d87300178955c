//! Reactive session state container.
//!
//! The store is the authoritative in-memory view of the session list, the
//! current selection, and the configuration flag. Every mutation updates the
//! in-memory state first; durable writes either complete before the mutation
//! is applied (create, delete, rename, save-config) or are queued on a
//! write-behind channel (message appends), so the in-memory state is always
//! ahead of or equal to the durable copy and never diverges by reordering.
//!
//! A single consumer drains the write-behind channel, which makes durable
//! session snapshots settle in the same order their mutations occurred. A
//! failed queued write is reported through the diagnostic log and is never
//! rolled back.

use std::sync::Arc;

use tokio::sync::{RwLock, mpsc, oneshot, watch};

use banter_core::config::{CONFIG_KEY, ChatConfig};
use banter_core::error::Result;
use banter_core::log::{LogBuffer, LogEntry, LogLevel};
use banter_core::repository::{ConfigRepository, SessionRepository};
use banter_core::session::{Message, Session};

#[derive(Default)]
struct StoreState {
    sessions: Vec<Session>,
    current_id: Option<String>,
    config: Option<ChatConfig>,
    configured: bool,
}

enum PersistJob {
    SaveSession(Session),
    Flush(oneshot::Sender<()>),
}

/// In-memory source of truth for conversation state.
pub struct SessionStore {
    sessions_repo: Arc<dyn SessionRepository>,
    config_repo: Arc<dyn ConfigRepository>,
    state: RwLock<StoreState>,
    log: Arc<LogBuffer>,
    version: watch::Sender<u64>,
    persist: mpsc::UnboundedSender<PersistJob>,
}

impl SessionStore {
    /// Creates the store and spawns its write-behind persister task.
    pub fn new(
        sessions_repo: Arc<dyn SessionRepository>,
        config_repo: Arc<dyn ConfigRepository>,
    ) -> Arc<Self> {
        let log = Arc::new(LogBuffer::default());
        let (persist_tx, persist_rx) = mpsc::unbounded_channel();
        let (version_tx, _) = watch::channel(0u64);

        tokio::spawn(run_persister(persist_rx, sessions_repo.clone(), log.clone()));

        Arc::new(Self {
            sessions_repo,
            config_repo,
            state: RwLock::new(StoreState::default()),
            log,
            version: version_tx,
            persist: persist_tx,
        })
    }

    /// Loads every stored session, bootstrapping one when the store is empty
    /// and repairing a stale selection.
    pub async fn load_sessions(&self) -> Result<()> {
        let loaded = self.sessions_repo.list_all().await?;

        if loaded.is_empty() {
            let session = Session::new("Session 1");
            self.sessions_repo.insert(&session).await?;
            let mut state = self.state.write().await;
            state.current_id = Some(session.id.clone());
            state.sessions = vec![session];
        } else {
            let mut state = self.state.write().await;
            let selection_alive = state
                .current_id
                .as_ref()
                .is_some_and(|id| loaded.iter().any(|s| &s.id == id));
            if !selection_alive {
                state.current_id = loaded.first().map(|s| s.id.clone());
            }
            state.sessions = loaded;
        }

        self.bump();
        Ok(())
    }

    /// Moves the selection pointer. Purely in-memory; selecting an unknown
    /// id leaves the pointer unchanged.
    pub async fn select_session(&self, session_id: Option<&str>) {
        {
            let mut state = self.state.write().await;
            match session_id {
                Some(id) if state.sessions.iter().any(|s| s.id == id) => {
                    state.current_id = Some(id.to_string());
                }
                Some(_) => return,
                None => state.current_id = None,
            }
        }
        self.bump();
    }

    /// Creates, persists, and selects a new session.
    pub async fn create_session(&self, title_hint: Option<&str>) -> Result<Session> {
        let title = match title_hint.map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => {
                let count = self.state.read().await.sessions.len();
                format!("Session {}", count + 1)
            }
        };

        let session = Session::new(title);
        self.sessions_repo.insert(&session).await?;

        {
            let mut state = self.state.write().await;
            state.sessions.push(session.clone());
            state.current_id = Some(session.id.clone());
        }
        self.bump();
        Ok(session)
    }

    /// Deletes a session durably, then from memory.
    ///
    /// A durable failure propagates without touching the in-memory list so
    /// the two views cannot silently disagree. Deleting the selected session
    /// reselects the first remaining one, or none.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.sessions_repo.delete(session_id).await?;

        {
            let mut state = self.state.write().await;
            state.sessions.retain(|s| s.id != session_id);
            if state.current_id.as_deref() == Some(session_id) {
                state.current_id = state.sessions.first().map(|s| s.id.clone());
            }
        }
        self.bump();
        Ok(())
    }

    /// Renames a session in both copies. Empty or whitespace-only titles are
    /// a no-op and issue no durable write.
    pub async fn rename_session(&self, session_id: &str, new_title: &str) -> Result<()> {
        let title = new_title.trim();
        if title.is_empty() {
            return Ok(());
        }

        let updated = {
            let state = self.state.read().await;
            let Some(session) = state.sessions.iter().find(|s| s.id == session_id) else {
                return Ok(());
            };
            let mut updated = session.clone();
            updated.title = title.to_string();
            updated
        };

        self.sessions_repo.save(&updated).await?;

        {
            let mut state = self.state.write().await;
            if let Some(session) = state.sessions.iter_mut().find(|s| s.id == session_id) {
                session.title = updated.title.clone();
            }
        }
        self.bump();
        Ok(())
    }

    /// Appends a message to the selected session.
    ///
    /// The in-memory append happens synchronously; the durable write of the
    /// updated session snapshot is queued and never blocks or reverts this
    /// call. Without a selection this is a no-op.
    pub async fn append_message(&self, message: Message) -> Result<()> {
        let snapshot = {
            let mut state = self.state.write().await;
            let Some(current_id) = state.current_id.clone() else {
                return Ok(());
            };
            let Some(session) = state.sessions.iter_mut().find(|s| s.id == current_id) else {
                return Ok(());
            };
            session.push_message(message);
            session.clone()
        };

        if self.persist.send(PersistJob::SaveSession(snapshot)).is_err() {
            self.log.push(
                LogLevel::Error,
                "session persistence task is no longer running",
                None,
            );
        }
        self.bump();
        Ok(())
    }

    /// Persists the configuration, then marks the store configured.
    ///
    /// On a durable failure the store stays unconfigured and the fault
    /// propagates instead of claiming success.
    pub async fn set_configuration(&self, mut config: ChatConfig) -> Result<()> {
        config.id = CONFIG_KEY.to_string();
        config.ensure_default_modalities();

        self.config_repo.save(&config).await?;

        {
            let mut state = self.state.write().await;
            state.config = Some(config);
            state.configured = true;
        }
        self.bump();
        Ok(())
    }

    /// Adopts the persisted configuration record at startup, if one exists.
    pub async fn load_configuration(&self) -> Result<Option<ChatConfig>> {
        let Some(config) = self.config_repo.load().await? else {
            return Ok(None);
        };
        {
            let mut state = self.state.write().await;
            state.config = Some(config.clone());
            state.configured = true;
        }
        self.bump();
        Ok(Some(config))
    }

    /// Snapshot of the session list.
    pub async fn sessions(&self) -> Vec<Session> {
        self.state.read().await.sessions.clone()
    }

    /// Snapshot of the selected session.
    pub async fn current_session(&self) -> Option<Session> {
        let state = self.state.read().await;
        let id = state.current_id.as_ref()?;
        state.sessions.iter().find(|s| &s.id == id).cloned()
    }

    pub async fn current_session_id(&self) -> Option<String> {
        self.state.read().await.current_id.clone()
    }

    pub async fn configuration(&self) -> Option<ChatConfig> {
        self.state.read().await.config.clone()
    }

    pub async fn is_configured(&self) -> bool {
        self.state.read().await.configured
    }

    /// Subscribes to the mutation counter. The value changes after every
    /// state transition; UI layers poll or await it instead of observing
    /// internals.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Appends a diagnostic entry.
    pub fn add_log(&self, level: LogLevel, message: impl Into<String>, details: Option<String>) {
        self.log.push(level, message, details);
    }

    /// Snapshot of the diagnostic log.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.log.snapshot()
    }

    /// Waits until every queued durable write has settled.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.persist.send(PersistJob::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

async fn run_persister(
    mut rx: mpsc::UnboundedReceiver<PersistJob>,
    repo: Arc<dyn SessionRepository>,
    log: Arc<LogBuffer>,
) {
    while let Some(job) = rx.recv().await {
        match job {
            PersistJob::SaveSession(session) => {
                if let Err(err) = repo.save(&session).await {
                    tracing::error!("failed to persist session {}: {err}", session.id);
                    log.push(
                        LogLevel::Error,
                        "failed to save session",
                        Some(err.to_string()),
                    );
                }
            }
            PersistJob::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}
