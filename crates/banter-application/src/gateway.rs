//! Configuration gateway.
//!
//! Holds the process-lifetime client handle built from the persisted
//! configuration record. Only the record is durable; every process start must
//! call [`ConfigGateway::initialize`] again before the first remote call.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use banter_core::config::ChatConfig;
use banter_core::error::{BanterError, Result};
use banter_interaction::gemini::{GeminiClient, GenerateContent, ModelHandle};

/// Source of ready-to-call model handles.
///
/// The pipeline depends on this trait rather than the gateway directly so
/// tests can substitute a stub backend.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn current_model(&self) -> Result<Arc<dyn GenerateContent>>;
}

struct GatewayState {
    client: GeminiClient,
    config: ChatConfig,
}

/// Caches the remote client and the configuration snapshot it was built from.
#[derive(Default)]
pub struct ConfigGateway {
    inner: RwLock<Option<GatewayState>>,
}

impl ConfigGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the configuration and caches a client built from it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the credential or model name is missing;
    /// the gateway keeps its previous state in that case.
    pub async fn initialize(&self, config: ChatConfig) -> Result<()> {
        config.validate()?;
        let client = GeminiClient::new(config.api_key.clone())?;
        *self.inner.write().await = Some(GatewayState { client, config });
        Ok(())
    }

    /// Builds a model handle from the cached client and the configured model
    /// identifier and generation options.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` when no configuration has been supplied in
    /// this process lifetime.
    pub async fn current_handle(&self) -> Result<ModelHandle> {
        let inner = self.inner.read().await;
        let state = inner.as_ref().ok_or(BanterError::NotInitialized)?;
        Ok(state
            .client
            .model(state.config.model_name.clone(), state.config.generation.clone()))
    }

    pub async fn is_initialized(&self) -> bool {
        self.inner.read().await.is_some()
    }
}

#[async_trait]
impl ModelProvider for ConfigGateway {
    async fn current_model(&self) -> Result<Arc<dyn GenerateContent>> {
        Ok(Arc::new(self.current_handle().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn uninitialized_gateway_rejects_model_requests() {
        let gateway = ConfigGateway::new();
        assert!(!gateway.is_initialized().await);
        assert!(matches!(
            gateway.current_handle().await,
            Err(BanterError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn blank_credential_is_rejected_and_state_is_kept() {
        let gateway = ConfigGateway::new();
        let err = gateway
            .initialize(ChatConfig::new("   ", "gemini-2.0-flash"))
            .await
            .unwrap_err();
        assert!(matches!(err, BanterError::InvalidConfig(_)));
        assert!(!gateway.is_initialized().await);
    }

    #[tokio::test]
    async fn initialize_caches_the_configured_model() {
        let gateway = ConfigGateway::new();
        gateway
            .initialize(ChatConfig::new("secret", "gemini-2.0-flash"))
            .await
            .unwrap();

        let handle = gateway.current_handle().await.unwrap();
        assert_eq!(handle.model_name(), "gemini-2.0-flash");

        // Reinitializing swaps the model.
        gateway
            .initialize(ChatConfig::new("secret", "gemini-1.5-flash"))
            .await
            .unwrap();
        let handle = gateway.current_handle().await.unwrap();
        assert_eq!(handle.model_name(), "gemini-1.5-flash");
    }
}
