//! Application wiring.
//!
//! Opens the document store once, builds the repositories and services on
//! top of it, restores persisted state, and hands the assembled components
//! to the embedding UI.

use std::sync::Arc;

use anyhow::Result;

use banter_core::log::LogLevel;
use banter_infrastructure::document_store::DocumentStore;
use banter_infrastructure::paths::BanterPaths;
use banter_infrastructure::prefs::PrefsFile;
use banter_infrastructure::repositories::{
    StoreCommandRepository, StoreConfigRepository, StoreSessionRepository, StoreUserRepository,
};
use banter_infrastructure::schema::chat_schema;

use crate::auth::AuthService;
use crate::commands::CommandTracker;
use crate::gateway::ConfigGateway;
use crate::pipeline::ExchangePipeline;
use crate::session_store::SessionStore;

/// The assembled application components.
pub struct App {
    pub store: Arc<DocumentStore>,
    pub sessions: Arc<SessionStore>,
    pub gateway: Arc<ConfigGateway>,
    pub pipeline: Arc<ExchangePipeline>,
    pub auth: Arc<AuthService>,
    pub commands: Arc<CommandTracker>,
}

/// Builds the application from the given paths.
///
/// Recovers automatically from a corrupt store (the session store then
/// bootstraps a fresh first session) and tolerates a missing or unusable
/// configuration record: the app starts unconfigured and the UI is expected
/// to prompt for configuration.
pub async fn bootstrap(paths: &BanterPaths) -> Result<App> {
    let data_dir = paths.data_dir()?;
    let store = Arc::new(DocumentStore::open(&data_dir, &chat_schema()).await?);

    let session_repo = Arc::new(StoreSessionRepository::new(store.clone()));
    let config_repo = Arc::new(StoreConfigRepository::new(store.clone()));
    let sessions = SessionStore::new(session_repo, config_repo);
    sessions.load_sessions().await?;

    let gateway = Arc::new(ConfigGateway::new());
    match sessions.load_configuration().await {
        Ok(Some(config)) => {
            if let Err(err) = gateway.initialize(config).await {
                tracing::warn!("stored configuration is unusable: {err}");
                sessions.add_log(
                    LogLevel::Warn,
                    "stored configuration is unusable",
                    Some(err.to_string()),
                );
            }
        }
        Ok(None) => {
            tracing::info!("no stored configuration; sends are disabled until one is saved");
        }
        Err(err) => {
            tracing::warn!("failed to load configuration: {err}");
            sessions.add_log(
                LogLevel::Error,
                "failed to load configuration",
                Some(err.to_string()),
            );
        }
    }

    let pipeline = Arc::new(ExchangePipeline::new(sessions.clone(), gateway.clone()));
    let auth = Arc::new(AuthService::new(
        Arc::new(StoreUserRepository::new(store.clone())),
        PrefsFile::new(paths.prefs_file()?),
    ));
    let commands = Arc::new(CommandTracker::new(Arc::new(StoreCommandRepository::new(
        store.clone(),
    ))));

    Ok(App {
        store,
        sessions,
        gateway,
        pipeline,
        auth,
        commands,
    })
}
