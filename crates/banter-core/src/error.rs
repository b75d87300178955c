//! Error types for the Banter application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Banter application.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum BanterError {
    /// Durable store unavailable, corrupt, or handed a record that violates
    /// the collection's key shape.
    #[error("storage error: {message}")]
    Storage { message: String },

    /// Insert into a collection that already holds the key.
    #[error("duplicate key '{key}' in collection '{collection}'")]
    DuplicateKey { collection: String, key: String },

    /// The caller attempted an action with missing prerequisite state.
    #[error("{0}")]
    Precondition(String),

    /// Configuration record missing a required field or otherwise malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The remote service client has not been initialized in this process.
    #[error("remote service is not initialized")]
    NotInitialized,

    /// The remote call succeeded transport-wise but returned nothing usable.
    #[error("the model returned no usable content")]
    NoContent,

    /// Network or service failure during a remote call.
    #[error("remote service error: {message}")]
    RemoteService {
        message: String,
        model_deprecated: bool,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Internal error (should not happen in normal operation).
    #[error("internal error: {0}")]
    Internal(String),
}

impl BanterError {
    /// Creates a Storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a DuplicateKey error.
    pub fn duplicate_key(collection: impl Into<String>, key: impl Into<String>) -> Self {
        Self::DuplicateKey {
            collection: collection.into(),
            key: key.into(),
        }
    }

    /// Creates a Precondition error.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Creates an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Creates a RemoteService error.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteService {
            message: message.into(),
            model_deprecated: false,
        }
    }

    /// Creates an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a Storage error.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }

    /// Check if this is a DuplicateKey error.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }

    /// Check if this is a Precondition error.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }

    /// Check if this error reports that the selected model is no longer
    /// served by the remote.
    pub fn is_model_deprecated(&self) -> bool {
        matches!(
            self,
            Self::RemoteService {
                model_deprecated: true,
                ..
            }
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for BanterError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for BanterError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for BanterError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for BanterError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<String> for BanterError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, BanterError>`.
pub type Result<T> = std::result::Result<T, BanterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deprecated_flag_is_detected() {
        let err = BanterError::RemoteService {
            message: "gemini-pro-vision has been deprecated".to_string(),
            model_deprecated: true,
        };
        assert!(err.is_model_deprecated());
        assert!(!BanterError::remote("boom").is_model_deprecated());
    }

    #[test]
    fn io_errors_map_to_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: BanterError = io.into();
        assert!(err.is_storage());
    }
}
