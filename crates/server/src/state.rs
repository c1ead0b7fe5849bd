use std::sync::Arc;

use indexgate_core::{
    Config, ProviderRegistry, ProviderStatusStore, SanitizedConfig, UrlSubstitutionResolver,
};

/// Shared application state
pub struct AppState {
    config: Config,
    registry: Arc<ProviderRegistry>,
}

impl AppState {
    pub fn new(config: Config, registry: Arc<ProviderRegistry>) -> Self {
        Self { config, registry }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn status_store(&self) -> &ProviderStatusStore {
        self.registry.status_store()
    }

    pub fn resolver(&self) -> &UrlSubstitutionResolver {
        self.registry.resolver()
    }
}
