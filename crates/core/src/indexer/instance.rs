//! A configured indexer paired with its live behaviour and settings.

use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use super::traits::{Indexer, IndexerError};
use super::types::{base_url_of, IndexerCapabilities, IndexerDefinition, Operation, BASE_URL_KEY};

/// Live handle to one configured indexer.
///
/// The definition is kept exactly as it was handed over. Settings start as a
/// copy of the definition's settings and may be rewritten in place (URL
/// substitution) without touching the definition.
pub struct ProviderInstance {
    definition: IndexerDefinition,
    indexer: Arc<dyn Indexer>,
    settings: RwLock<Value>,
}

impl std::fmt::Debug for ProviderInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderInstance")
            .field("id", &self.definition.id)
            .field("name", &self.definition.name)
            .field("implementation", &self.indexer.implementation())
            .finish()
    }
}

impl ProviderInstance {
    /// Build an instance, copying the implementation's characteristics onto
    /// the definition and rejecting flags the implementation cannot honour.
    pub fn new(
        mut definition: IndexerDefinition,
        indexer: Arc<dyn Indexer>,
    ) -> Result<Self, IndexerError> {
        let capabilities = indexer.capabilities();
        definition.protocol = capabilities.protocol;
        definition.supports_rss = capabilities.supports_rss;
        definition.supports_search = capabilities.supports_search;

        for operation in [Operation::Rss, Operation::Search] {
            if definition.is_enabled_for(operation) && !capabilities.supports(operation) {
                return Err(IndexerError::CapabilityMismatch {
                    id: definition.id,
                    name: definition.name.clone(),
                    operation,
                });
            }
        }

        let settings = RwLock::new(definition.settings.clone());
        Ok(Self {
            definition,
            indexer,
            settings,
        })
    }

    pub fn id(&self) -> u32 {
        self.definition.id
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// The definition as provided by the definition store.
    pub fn definition(&self) -> &IndexerDefinition {
        &self.definition
    }

    pub fn indexer(&self) -> &Arc<dyn Indexer> {
        &self.indexer
    }

    pub fn capabilities(&self) -> IndexerCapabilities {
        self.indexer.capabilities()
    }

    /// Whether this instance may be offered for the operation, ignoring health.
    pub fn is_available_for(&self, operation: Operation) -> bool {
        self.definition.enabled && self.definition.is_enabled_for(operation)
    }

    /// Snapshot of the live settings.
    pub fn settings(&self) -> Value {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Base URL from the live settings.
    pub fn base_url(&self) -> Option<String> {
        let settings = self.settings.read().unwrap_or_else(PoisonError::into_inner);
        base_url_of(&settings).map(str::to_string)
    }

    /// Rewrite the live base URL. Returns false if the settings carry no base
    /// URL to rewrite.
    pub(crate) fn set_base_url(&self, url: &str) -> bool {
        let mut settings = self
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if base_url_of(&settings).is_none() {
            return false;
        }
        match settings.as_object_mut() {
            Some(map) => {
                map.insert(BASE_URL_KEY.to_string(), Value::String(url.to_string()));
                true
            }
            None => false,
        }
    }
}
