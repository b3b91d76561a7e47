//! Error types for the companion core.
//!
//! Only the trait store and configuration loading can fail with an error
//! value. Classification and aggregation are total functions, and handler
//! faults on the event bus are logged rather than returned.

use thiserror::Error;

/// Errors raised by a [`TraitStore`](crate::personality::TraitStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store is not reachable (offline, switched off, not initialised).
    #[error("Trait store unavailable: {message}")]
    Unavailable { message: String },

    /// The backend rejected the operation.
    #[error("Trait store backend error: {message}")]
    Backend { message: String },

    /// Stored traits could not be encoded or decoded.
    #[error("Trait store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Underlying SQLite error.
    #[error("Trait store SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// Errors raised while loading configuration or keyword tables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read configuration '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON decoding failed.
    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML decoding failed.
    #[error("Invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A keyword table without the `en` fallback entry.
    #[error("Keyword configuration must contain an 'en' entry")]
    MissingFallbackLanguage,

    /// A value was present but out of its allowed range.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_messages() {
        let err = StoreError::unavailable("offline");
        assert_eq!(err.to_string(), "Trait store unavailable: offline");

        let err = StoreError::backend("disk full");
        assert_eq!(err.to_string(), "Trait store backend error: disk full");
    }

    #[test]
    fn test_config_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ConfigError = json_err.into();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(err.to_string().starts_with("Invalid JSON configuration"));
    }

    #[test]
    fn test_missing_fallback_message() {
        assert_eq!(
            ConfigError::MissingFallbackLanguage.to_string(),
            "Keyword configuration must contain an 'en' entry"
        );
    }
}
