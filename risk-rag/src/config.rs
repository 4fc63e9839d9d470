//! Configuration for the question-answering pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Environment variable naming the JSON record file.
pub const DATA_PATH_ENV: &str = "RISK_RAG_DATA";

/// Configuration parameters for the assistant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantConfig {
    /// Path of the JSON array holding the raw records.
    pub data_path: PathBuf,
    /// Number of semantic results for plain questions.
    pub default_top_k: usize,
    /// Number of semantic results for listing questions ("which", "list", "show").
    pub listing_top_k: usize,
    /// Number of semantic results for counting questions ("how many").
    pub count_top_k: usize,
    /// Maximum number of identifiers honoured in a single question.
    pub max_identifiers: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data.json"),
            default_top_k: 10,
            listing_top_k: 20,
            count_top_k: 50,
            max_identifiers: 3,
        }
    }
}

impl AssistantConfig {
    /// Create a new builder for constructing an [`AssistantConfig`].
    pub fn builder() -> AssistantConfigBuilder {
        AssistantConfigBuilder::default()
    }

    /// Build a configuration from defaults, overriding the data path with
    /// `RISK_RAG_DATA` when it is set.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();
        if let Ok(path) = std::env::var(DATA_PATH_ENV) {
            builder = builder.data_path(path);
        }
        builder.build()
    }
}

/// Builder for constructing a validated [`AssistantConfig`].
#[derive(Debug, Clone, Default)]
pub struct AssistantConfigBuilder {
    config: AssistantConfig,
}

impl AssistantConfigBuilder {
    /// Set the path of the JSON record file.
    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_path = path.into();
        self
    }

    /// Set the result size for plain questions.
    pub fn default_top_k(mut self, k: usize) -> Self {
        self.config.default_top_k = k;
        self
    }

    /// Set the result size for listing questions.
    pub fn listing_top_k(mut self, k: usize) -> Self {
        self.config.listing_top_k = k;
        self
    }

    /// Set the result size for counting questions.
    pub fn count_top_k(mut self, k: usize) -> Self {
        self.config.count_top_k = k;
        self
    }

    /// Set the maximum number of identifiers extracted from one question.
    pub fn max_identifiers(mut self, max: usize) -> Self {
        self.config.max_identifiers = max;
        self
    }

    /// Build the [`AssistantConfig`], validating that parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any top-k value or
    /// `max_identifiers` is zero, or if `data_path` is empty.
    pub fn build(self) -> Result<AssistantConfig> {
        let config = self.config;
        if config.data_path.as_os_str().is_empty() {
            return Err(RagError::ConfigError("data_path must not be empty".to_string()));
        }
        for (name, value) in [
            ("default_top_k", config.default_top_k),
            ("listing_top_k", config.listing_top_k),
            ("count_top_k", config.count_top_k),
            ("max_identifiers", config.max_identifiers),
        ] {
            if value == 0 {
                return Err(RagError::ConfigError(format!("{name} must be greater than zero")));
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_question_tiers() {
        let config = AssistantConfig::default();
        assert_eq!(config.default_top_k, 10);
        assert_eq!(config.listing_top_k, 20);
        assert_eq!(config.count_top_k, 50);
        assert_eq!(config.max_identifiers, 3);
    }

    #[test]
    fn builder_rejects_zero_top_k() {
        let err = AssistantConfig::builder().listing_top_k(0).build().unwrap_err();
        assert!(matches!(err, RagError::ConfigError(msg) if msg.contains("listing_top_k")));
    }

    #[test]
    fn builder_rejects_empty_data_path() {
        let err = AssistantConfig::builder().data_path("").build().unwrap_err();
        assert!(matches!(err, RagError::ConfigError(_)));
    }

    #[test]
    fn builder_overrides_fields() {
        let config = AssistantConfig::builder()
            .data_path("/tmp/records.json")
            .default_top_k(5)
            .max_identifiers(1)
            .build()
            .unwrap();
        assert_eq!(config.data_path, PathBuf::from("/tmp/records.json"));
        assert_eq!(config.default_top_k, 5);
        assert_eq!(config.max_identifiers, 1);
    }
}
