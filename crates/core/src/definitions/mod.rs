//! Indexer definition sources.
//!
//! Definitions are owned by an external store; the registry reads them through
//! a [`DefinitionSource`] and is told about changes with [`DefinitionEvent`]s.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::config::{load_config, ConfigError};
use crate::indexer::IndexerDefinition;

/// Errors that can occur while reading definitions.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("Definition source unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid definition: {0}")]
    Invalid(String),
}

/// Change notification from the definition store.
#[derive(Debug, Clone, PartialEq)]
pub enum DefinitionEvent {
    Added(IndexerDefinition),
    Updated(IndexerDefinition),
    Removed(u32),
    /// Everything may have changed; reload from the source.
    Reloaded,
}

/// Read access to the definition store.
#[async_trait]
pub trait DefinitionSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// All definitions, in the store's enumeration order.
    async fn load_all(&self) -> Result<Vec<IndexerDefinition>, DefinitionError>;
}

/// Definitions taken from the `[[indexers]]` section of the configuration.
///
/// When built from a path the file is re-read on every load, so edits are
/// picked up by a reload.
#[derive(Debug, Clone)]
pub struct ConfigDefinitionSource {
    path: Option<PathBuf>,
    definitions: Vec<IndexerDefinition>,
}

impl ConfigDefinitionSource {
    /// Serve a fixed list of definitions.
    pub fn new(definitions: Vec<IndexerDefinition>) -> Self {
        Self {
            path: None,
            definitions,
        }
    }

    /// Serve the definitions of a configuration file.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            definitions: Vec::new(),
        }
    }
}

#[async_trait]
impl DefinitionSource for ConfigDefinitionSource {
    fn name(&self) -> &str {
        "config"
    }

    async fn load_all(&self) -> Result<Vec<IndexerDefinition>, DefinitionError> {
        let Some(path) = &self.path else {
            return Ok(self.definitions.clone());
        };

        debug!(path = %path.display(), "Reading indexer definitions");
        let config = load_config(path).map_err(|e| match e {
            ConfigError::FileNotFound(_) => DefinitionError::Unavailable(e.to_string()),
            ConfigError::ParseError(_) | ConfigError::ValidationError(_) => {
                DefinitionError::Invalid(e.to_string())
            }
        })?;
        Ok(config.indexers)
    }
}
