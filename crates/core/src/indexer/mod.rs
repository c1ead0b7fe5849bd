//! Indexer definitions, capability descriptors and live instances.
//!
//! Implementations are looked up by name in an [`IndexerCatalog`] and declare
//! what they can do through [`IndexerCapabilities`], so filtering is a field
//! check rather than a type check.

mod catalog;
mod instance;
mod traits;
mod types;

pub use catalog::{IndexerCatalog, IndexerConstructor, StaticIndexer};
pub use instance::ProviderInstance;
pub use traits::{Indexer, IndexerError};
pub use types::*;
