pub mod config;
pub mod definitions;
pub mod indexer;
pub mod metrics;
pub mod registry;
pub mod status;
pub mod substitution;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use definitions::{ConfigDefinitionSource, DefinitionEvent, DefinitionSource};
pub use indexer::{
    IndexerCatalog, IndexerDefinition, IndexerError, Operation, ProviderInstance,
};
pub use registry::{LoadReport, ProviderRegistry, RegistryError};
pub use status::{Clock, EscalationBackoff, ProviderStatus, ProviderStatusStore, SystemClock};
pub use substitution::{create_resolver, SubstitutionRule, UrlSubstitutionResolver};
