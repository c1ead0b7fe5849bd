//! The provider registry: which indexers may be used right now.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::types::{LoadReport, RegistryError, RejectedDefinition};
use crate::definitions::{DefinitionEvent, DefinitionSource};
use crate::indexer::{IndexerCatalog, IndexerDefinition, IndexerError, Operation, ProviderInstance};
use crate::metrics::{ELIGIBILITY_QUERIES, INDEXERS_SKIPPED_BLOCKED, URL_SUBSTITUTIONS};
use crate::status::ProviderStatusStore;
use crate::substitution::UrlSubstitutionResolver;

type Snapshot = Arc<Vec<Arc<ProviderInstance>>>;

/// Live collection of configured indexers.
///
/// The collection is copy-on-write: queries take the current snapshot and
/// release the lock, while updates build a new vector and swap it in, so a
/// query sees either the old or the new set, never a mix.
pub struct ProviderRegistry {
    catalog: IndexerCatalog,
    instances: RwLock<Snapshot>,
    status: Arc<ProviderStatusStore>,
    resolver: Arc<UrlSubstitutionResolver>,
    source: Option<Arc<dyn DefinitionSource>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("catalog", &self.catalog)
            .field("source", &self.source.as_ref().map(|s| s.name().to_string()))
            .finish()
    }
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new(
        catalog: IndexerCatalog,
        status: Arc<ProviderStatusStore>,
        resolver: Arc<UrlSubstitutionResolver>,
    ) -> Self {
        Self {
            catalog,
            instances: RwLock::new(Arc::new(Vec::new())),
            status,
            resolver,
            source: None,
        }
    }

    /// Attach the definition source used by [`reload`](Self::reload).
    pub fn with_source(mut self, source: Arc<dyn DefinitionSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn status_store(&self) -> &Arc<ProviderStatusStore> {
        &self.status
    }

    pub fn resolver(&self) -> &Arc<UrlSubstitutionResolver> {
        &self.resolver
    }

    // ------------------------------------------------------------------
    // Eligibility
    // ------------------------------------------------------------------

    /// Indexers that may be polled for RSS right now.
    pub async fn eligible_for_rss(&self, filter_blocked: bool) -> Vec<Arc<ProviderInstance>> {
        self.eligible(Operation::Rss, filter_blocked).await
    }

    /// Indexers that may be searched right now.
    pub async fn eligible_for_search(&self, filter_blocked: bool) -> Vec<Arc<ProviderInstance>> {
        self.eligible(Operation::Search, filter_blocked).await
    }

    /// Enabled indexers with the operation's flag set, in registration order.
    ///
    /// With `filter_blocked`, each candidate's base URL is substituted in its
    /// live settings first, then indexers in a failure cooldown are dropped.
    /// Without it, neither step runs.
    pub async fn eligible(
        &self,
        operation: Operation,
        filter_blocked: bool,
    ) -> Vec<Arc<ProviderInstance>> {
        ELIGIBILITY_QUERIES
            .with_label_values(&[operation.as_str()])
            .inc();

        let snapshot = self.snapshot().await;
        let candidates: Vec<_> = snapshot
            .iter()
            .filter(|instance| instance.is_available_for(operation))
            .cloned()
            .collect();

        if !filter_blocked {
            return candidates;
        }

        for instance in &candidates {
            self.substitute_url(instance).await;
        }

        let blocked = self.status.blocked_providers().await;
        candidates
            .into_iter()
            .filter(|instance| match blocked.get(&instance.id()) {
                Some(status) => {
                    INDEXERS_SKIPPED_BLOCKED
                        .with_label_values(&[operation.as_str()])
                        .inc();
                    debug!(
                        indexer = instance.name(),
                        disabled_till = ?status.disabled_till,
                        "Temporarily ignoring indexer due to recent failures"
                    );
                    false
                }
                None => true,
            })
            .collect()
    }

    async fn substitute_url(&self, instance: &ProviderInstance) {
        let Some(current) = instance.base_url() else {
            return;
        };

        let substituted = self.resolver.substitute(&current).await;
        if substituted != current && instance.set_base_url(&substituted) {
            URL_SUBSTITUTIONS.inc();
            debug!(
                indexer = instance.name(),
                from = %current,
                to = %substituted,
                "Substituted indexer URL since the blocklist marks it as deprecated"
            );
        }
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    async fn snapshot(&self) -> Snapshot {
        Arc::clone(&*self.instances.read().await)
    }

    /// Every registered indexer, enabled or not.
    pub async fn all(&self) -> Vec<Arc<ProviderInstance>> {
        self.snapshot().await.to_vec()
    }

    /// Every enabled indexer.
    pub async fn active(&self) -> Vec<Arc<ProviderInstance>> {
        self.snapshot()
            .await
            .iter()
            .filter(|instance| instance.definition().enabled)
            .cloned()
            .collect()
    }

    pub async fn get(&self, id: u32) -> Option<Arc<ProviderInstance>> {
        self.snapshot()
            .await
            .iter()
            .find(|instance| instance.id() == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.snapshot().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshot().await.is_empty()
    }

    // ------------------------------------------------------------------
    // Updates
    // ------------------------------------------------------------------

    fn build(&self, definition: IndexerDefinition) -> Result<Arc<ProviderInstance>, RegistryError> {
        let indexer = self.catalog.create(&definition.implementation).ok_or_else(|| {
            IndexerError::UnknownImplementation {
                id: definition.id,
                implementation: definition.implementation.clone(),
            }
        })?;
        Ok(Arc::new(ProviderInstance::new(definition, indexer)?))
    }

    /// Replace every registered indexer with the given definitions.
    ///
    /// Definitions that fail validation (unknown implementation, flags the
    /// implementation cannot honour, repeated ids) are skipped and reported.
    pub async fn replace_all(&self, definitions: Vec<IndexerDefinition>) -> LoadReport {
        let mut report = LoadReport::default();
        let mut seen = HashSet::new();
        let mut instances = Vec::with_capacity(definitions.len());

        for definition in definitions {
            let (id, name) = (definition.id, definition.name.clone());
            let built = if seen.insert(id) {
                self.build(definition)
            } else {
                Err(RegistryError::DuplicateId(id))
            };

            match built {
                Ok(instance) => instances.push(instance),
                Err(e) => {
                    warn!(indexer_id = id, indexer = %name, error = %e, "Rejected indexer definition");
                    report.rejected.push(RejectedDefinition {
                        id,
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report.loaded = instances.len();
        *self.instances.write().await = Arc::new(instances);
        info!(
            loaded = report.loaded,
            rejected = report.rejected.len(),
            "Indexer registry loaded"
        );
        report
    }

    /// Reload every definition from the attached source.
    pub async fn reload(&self) -> Result<LoadReport, RegistryError> {
        let source = self.source.as_ref().ok_or(RegistryError::NoDefinitionSource)?;
        let definitions = source.load_all().await?;
        Ok(self.replace_all(definitions).await)
    }

    /// Add a definition, or replace the instance registered under its id.
    ///
    /// A replaced instance keeps its position; a new one goes last.
    pub async fn upsert(
        &self,
        definition: IndexerDefinition,
    ) -> Result<Arc<ProviderInstance>, RegistryError> {
        let instance = self.build(definition)?;

        let mut guard = self.instances.write().await;
        let mut next: Vec<_> = guard.iter().cloned().collect();
        match next.iter().position(|existing| existing.id() == instance.id()) {
            Some(index) => {
                debug!(indexer = instance.name(), "Replacing indexer");
                next[index] = Arc::clone(&instance);
            }
            None => {
                debug!(indexer = instance.name(), "Adding indexer");
                next.push(Arc::clone(&instance));
            }
        }
        *guard = Arc::new(next);

        Ok(instance)
    }

    /// Drop the instance registered under `id`. Returns whether one existed.
    pub async fn remove(&self, id: u32) -> bool {
        let mut guard = self.instances.write().await;
        if !guard.iter().any(|instance| instance.id() == id) {
            return false;
        }
        let next: Vec<_> = guard
            .iter()
            .filter(|instance| instance.id() != id)
            .cloned()
            .collect();
        *guard = Arc::new(next);
        debug!(indexer_id = id, "Removed indexer");
        true
    }

    /// Apply a change notification from the definition store.
    pub async fn apply(&self, event: DefinitionEvent) -> Result<(), RegistryError> {
        match event {
            DefinitionEvent::Added(definition) | DefinitionEvent::Updated(definition) => {
                let id = definition.id;
                match self.upsert(definition).await {
                    Ok(_) => Ok(()),
                    Err(e) => {
                        // Same outcome as a reload rejecting it
                        if self.remove(id).await {
                            warn!(indexer_id = id, error = %e, "Dropped indexer after rejected update");
                        }
                        Err(e)
                    }
                }
            }
            DefinitionEvent::Removed(id) => {
                self.remove(id).await;
                Ok(())
            }
            DefinitionEvent::Reloaded => self.reload().await.map(|_| ()),
        }
    }

    /// Apply notifications from `events` until the sending side is dropped.
    pub fn watch(self: Arc<Self>, mut events: mpsc::Receiver<DefinitionEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if let Err(e) = self.apply(event).await {
                    warn!(error = %e, "Failed to apply indexer definition change");
                }
            }
            debug!("Definition event channel closed");
        })
    }
}
