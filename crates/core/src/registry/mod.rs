//! Indexer provider registry.
//!
//! Answers "which indexers may take part in an RSS poll or a search right
//! now", combining the enabled and capability flags of each definition, URL
//! substitution and the failure cooldowns of the status store.

mod provider_registry;
mod types;

pub use provider_registry::ProviderRegistry;
pub use types::*;
