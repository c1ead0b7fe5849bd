//! Testing utilities and mock implementations.
//!
//! This module provides mocks for the registry's collaborators (clock,
//! blocklist, definition store) so scenarios run without real time or
//! network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use indexgate_core::testing::{fixtures, ManualClock, MockBlocklistSource};
//!
//! let clock = Arc::new(ManualClock::new(fixtures::t0()));
//! let blocklist = Arc::new(MockBlocklistSource::new());
//! let registry = fixtures::registry_with(clock.clone(), Some(blocklist.clone()));
//!
//! registry.replace_all(vec![fixtures::definition(1, "A", "newznab")]).await;
//! registry.status_store().record_failure(1, clock.now()).await;
//! assert!(registry.eligible_for_search(true).await.is_empty());
//! ```

mod mock_blocklist;
mod mock_clock;
mod mock_definitions;

pub use mock_blocklist::MockBlocklistSource;
pub use mock_clock::ManualClock;
pub use mock_definitions::MockDefinitionSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::sync::Arc;
    use std::time::Duration as StdDuration;

    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::{json, Value};

    use super::{ManualClock, MockBlocklistSource};
    use crate::indexer::{DownloadProtocol, IndexerCatalog, IndexerDefinition};
    use crate::registry::ProviderRegistry;
    use crate::status::{EscalationBackoff, ProviderStatusStore};
    use crate::substitution::{ResolverSettings, UrlSubstitutionResolver};

    /// Fixed starting instant for clock-driven tests.
    pub fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    /// An enabled definition with RSS and search turned on and no settings.
    pub fn definition(id: u32, name: &str, implementation: &str) -> IndexerDefinition {
        IndexerDefinition {
            id,
            name: name.to_string(),
            implementation: implementation.to_string(),
            enabled: true,
            enable_rss: true,
            enable_search: true,
            protocol: DownloadProtocol::Unknown,
            supports_rss: false,
            supports_search: false,
            settings: Value::Null,
        }
    }

    /// Like [`definition`], with a `base_url` setting.
    pub fn definition_with_url(
        id: u32,
        name: &str,
        implementation: &str,
        base_url: &str,
    ) -> IndexerDefinition {
        IndexerDefinition {
            settings: json!({ "base_url": base_url }),
            ..definition(id, name, implementation)
        }
    }

    /// A definition for the RSS-only `torrent_rss` implementation.
    pub fn rss_only(id: u32, name: &str) -> IndexerDefinition {
        IndexerDefinition {
            enable_search: false,
            ..definition(id, name, "torrent_rss")
        }
    }

    /// Resolver settings short enough for tests.
    pub fn resolver_settings() -> ResolverSettings {
        ResolverSettings {
            fetch_timeout: StdDuration::from_millis(200),
            refresh_interval: StdDuration::from_secs(3600),
            failure_retry_interval: StdDuration::from_secs(3600),
        }
    }

    /// Empty registry with the built-in catalog, default backoff, the wall
    /// clock and substitution disabled.
    pub fn registry() -> ProviderRegistry {
        ProviderRegistry::new(
            IndexerCatalog::with_builtins(),
            Arc::new(ProviderStatusStore::default()),
            Arc::new(UrlSubstitutionResolver::disabled()),
        )
    }

    /// Empty registry driven by `clock`, substituting from `blocklist` when
    /// one is given.
    pub fn registry_with(
        clock: Arc<ManualClock>,
        blocklist: Option<Arc<MockBlocklistSource>>,
    ) -> ProviderRegistry {
        let status = ProviderStatusStore::with_clock(EscalationBackoff::default(), clock);
        let resolver = match blocklist {
            Some(source) => UrlSubstitutionResolver::new(source, resolver_settings()),
            None => UrlSubstitutionResolver::disabled(),
        };
        ProviderRegistry::new(
            IndexerCatalog::with_builtins(),
            Arc::new(status),
            Arc::new(resolver),
        )
    }
}
