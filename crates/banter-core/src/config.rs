//! Remote-service configuration model.

use serde::{Deserialize, Serialize};

use crate::error::{BanterError, Result};

/// Key of the single logical configuration record.
pub const CONFIG_KEY: &str = "default";

/// Output modalities the model may respond with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseModality {
    Text,
    Image,
}

/// Generation tuning options forwarded to the remote service.
///
/// Serialized in the camelCase shape the wire protocol expects, so the same
/// struct doubles as the persisted record and the request fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_modalities: Vec<ResponseModality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
}

/// The singleton configuration record: credential, model selection, and
/// generation options. Mutated only via an explicit save and read back
/// before every remote call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatConfig {
    /// Record key, always [`CONFIG_KEY`].
    #[serde(default = "default_config_id")]
    pub id: String,
    pub api_key: String,
    pub model_name: String,
    #[serde(default)]
    pub generation: GenerationOptions,
}

fn default_config_id() -> String {
    CONFIG_KEY.to_string()
}

impl ChatConfig {
    pub fn new(api_key: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            id: default_config_id(),
            api_key: api_key.into(),
            model_name: model_name.into(),
            generation: GenerationOptions::default(),
        }
    }

    /// Fills in the default response modalities when none were chosen.
    pub fn ensure_default_modalities(&mut self) {
        if self.generation.response_modalities.is_empty() {
            self.generation.response_modalities =
                vec![ResponseModality::Text, ResponseModality::Image];
        }
    }

    /// Validates that the record can drive a remote call.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(BanterError::invalid_config("API key is required"));
        }
        if self.model_name.trim().is_empty() {
            return Err(BanterError::invalid_config("model name is required"));
        }
        Ok(())
    }
}
