//! Types for the provider registry.

use serde::Serialize;
use thiserror::Error;

use crate::definitions::DefinitionError;
use crate::indexer::IndexerError;

/// Errors that can occur while changing the registered indexers.
///
/// Eligibility queries never fail; these only come out of loads and updates.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Indexer(#[from] IndexerError),

    #[error("Duplicate indexer id {0}")]
    DuplicateId(u32),

    #[error("No definition source configured")]
    NoDefinitionSource,

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

/// A definition that was skipped during a bulk load.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RejectedDefinition {
    pub id: u32,
    pub name: String,
    pub reason: String,
}

/// Outcome of a bulk load.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedDefinition>,
}
