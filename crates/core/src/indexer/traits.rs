use thiserror::Error;

use super::types::{IndexerCapabilities, Operation};

/// Errors raised while turning a definition into a live instance.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IndexerError {
    #[error("Unknown indexer implementation '{implementation}' for indexer {id}")]
    UnknownImplementation { id: u32, implementation: String },

    #[error("Indexer {id} ({name}) enables {} but its implementation does not support it", .operation.as_str())]
    CapabilityMismatch {
        id: u32,
        name: String,
        operation: Operation,
    },
}

/// Behavioural object behind a configured indexer.
///
/// The protocol work (RSS fetches, searches) lives with the implementations;
/// the registry only needs to know what each one is able to do.
pub trait Indexer: Send + Sync {
    /// Implementation key, e.g. "newznab".
    fn implementation(&self) -> &str;

    /// What this implementation can do.
    fn capabilities(&self) -> IndexerCapabilities;
}
