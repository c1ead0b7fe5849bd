//! Known indexer implementations, keyed by implementation name.

use std::collections::HashMap;
use std::sync::Arc;

use super::traits::Indexer;
use super::types::{DownloadProtocol, IndexerCapabilities};

/// Builds the behavioural object for a definition.
pub type IndexerConstructor = Arc<dyn Fn() -> Arc<dyn Indexer> + Send + Sync>;

/// Implementation that is fully described by its capabilities.
#[derive(Debug, Clone)]
pub struct StaticIndexer {
    implementation: String,
    capabilities: IndexerCapabilities,
}

impl StaticIndexer {
    pub fn new(implementation: impl Into<String>, capabilities: IndexerCapabilities) -> Self {
        Self {
            implementation: implementation.into(),
            capabilities,
        }
    }
}

impl Indexer for StaticIndexer {
    fn implementation(&self) -> &str {
        &self.implementation
    }

    fn capabilities(&self) -> IndexerCapabilities {
        self.capabilities
    }
}

/// Catalog of implementations the registry can instantiate.
#[derive(Clone, Default)]
pub struct IndexerCatalog {
    constructors: HashMap<String, IndexerConstructor>,
}

impl std::fmt::Debug for IndexerCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.constructors.keys().collect();
        names.sort();
        f.debug_struct("IndexerCatalog")
            .field("implementations", &names)
            .finish()
    }
}

impl IndexerCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog with the built-in implementations registered.
    pub fn with_builtins() -> Self {
        use DownloadProtocol::{Torrent, Usenet};

        let mut catalog = Self::new();
        for (name, protocol, rss, search) in [
            ("newznab", Usenet, true, true),
            ("omgwtfnzbs", Usenet, true, true),
            ("torznab", Torrent, true, true),
            ("torrent_rss", Torrent, true, false),
            ("iptorrents", Torrent, true, false),
            ("torrentleech", Torrent, true, false),
            ("hdbits", Torrent, true, true),
            ("nyaa", Torrent, true, true),
        ] {
            catalog.register_static(name, IndexerCapabilities::new(protocol, rss, search));
        }
        catalog
    }

    /// Register (or replace) an implementation.
    pub fn register<F>(&mut self, implementation: impl Into<String>, constructor: F)
    where
        F: Fn() -> Arc<dyn Indexer> + Send + Sync + 'static,
    {
        self.constructors
            .insert(implementation.into(), Arc::new(constructor));
    }

    /// Register an implementation described only by its capabilities.
    pub fn register_static(&mut self, implementation: &str, capabilities: IndexerCapabilities) {
        let indexer: Arc<dyn Indexer> = Arc::new(StaticIndexer::new(implementation, capabilities));
        self.register(implementation, move || Arc::clone(&indexer));
    }

    /// Instantiate an implementation by name.
    pub fn create(&self, implementation: &str) -> Option<Arc<dyn Indexer>> {
        self.constructors.get(implementation).map(|build| build())
    }

    pub fn contains(&self, implementation: &str) -> bool {
        self.constructors.contains_key(implementation)
    }

    /// Registered implementation names, sorted.
    pub fn implementations(&self) -> Vec<String> {
        let mut names: Vec<_> = self.constructors.keys().cloned().collect();
        names.sort();
        names
    }
}
