//! Mock definition source for testing.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::definitions::{DefinitionError, DefinitionSource};
use crate::indexer::IndexerDefinition;

/// Definition store whose contents tests can swap between reloads.
#[derive(Debug, Default)]
pub struct MockDefinitionSource {
    definitions: Mutex<Vec<IndexerDefinition>>,
    unavailable: Mutex<bool>,
}

impl MockDefinitionSource {
    pub fn new(definitions: Vec<IndexerDefinition>) -> Self {
        Self {
            definitions: Mutex::new(definitions),
            unavailable: Mutex::new(false),
        }
    }

    pub fn set_definitions(&self, definitions: Vec<IndexerDefinition>) {
        *self
            .definitions
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = definitions;
    }

    /// Make subsequent loads fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self
            .unavailable
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = unavailable;
    }
}

#[async_trait]
impl DefinitionSource for MockDefinitionSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn load_all(&self) -> Result<Vec<IndexerDefinition>, DefinitionError> {
        if *self
            .unavailable
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
        {
            return Err(DefinitionError::Unavailable("mock store offline".to_string()));
        }
        Ok(self
            .definitions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}
