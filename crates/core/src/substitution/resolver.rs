//! Best-effort base URL substitution backed by a cached blocklist.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::rules::CompiledRules;
use super::types::{BlocklistError, BlocklistSource};
use crate::config::SubstitutionConfig;
use crate::metrics::BLOCKLIST_REFRESHES;

/// Timing knobs for the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Upper bound on a single blocklist fetch.
    pub fetch_timeout: Duration,
    /// How long a successfully fetched blocklist is used.
    pub refresh_interval: Duration,
    /// How long to go without rules after a failed fetch before retrying.
    pub failure_retry_interval: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self::from(&SubstitutionConfig::default())
    }
}

impl From<&SubstitutionConfig> for ResolverSettings {
    fn from(config: &SubstitutionConfig) -> Self {
        Self {
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            refresh_interval: Duration::from_secs(config.refresh_interval_secs),
            failure_retry_interval: Duration::from_secs(config.failure_retry_secs),
        }
    }
}

struct CachedRules {
    rules: Arc<CompiledRules>,
    expires_at: Instant,
}

/// Maps deprecated base URLs to their replacements.
///
/// `substitute` never fails: whenever the blocklist cannot be fetched or
/// parsed, URLs pass through unchanged until the next retry.
pub struct UrlSubstitutionResolver {
    source: Option<Arc<dyn BlocklistSource>>,
    settings: ResolverSettings,
    cache: RwLock<Option<CachedRules>>,
    refresh_gate: Mutex<()>,
}

impl std::fmt::Debug for UrlSubstitutionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSubstitutionResolver")
            .field("source", &self.source.as_ref().map(|s| s.name().to_string()))
            .field("settings", &self.settings)
            .finish()
    }
}

impl UrlSubstitutionResolver {
    /// Create a resolver backed by `source`.
    pub fn new(source: Arc<dyn BlocklistSource>, settings: ResolverSettings) -> Self {
        Self {
            source: Some(source),
            settings,
            cache: RwLock::new(None),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Create a resolver that never substitutes anything.
    pub fn disabled() -> Self {
        Self {
            source: None,
            settings: ResolverSettings::default(),
            cache: RwLock::new(None),
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.source.is_some()
    }

    /// Final replacement for `url`, or `url` itself when nothing applies.
    pub async fn substitute(&self, url: &str) -> String {
        let rules = self.current_rules().await;
        rules.resolve(url)
    }

    /// Force a blocklist reload, returning the number of rules now in use.
    pub async fn refresh(&self) -> Result<usize, BlocklistError> {
        if self.source.is_none() {
            return Ok(0);
        }
        let _gate = self.refresh_gate.lock().await;
        self.reload().await.map(|rules| rules.len())
    }

    async fn current_rules(&self) -> Arc<CompiledRules> {
        if self.source.is_none() {
            return Arc::new(CompiledRules::empty());
        }

        if let Some(rules) = self.fresh_rules().await {
            return rules;
        }

        // One fetch at a time; late arrivals reuse what the first one cached
        let _gate = self.refresh_gate.lock().await;
        if let Some(rules) = self.fresh_rules().await {
            return rules;
        }

        match self.reload().await {
            Ok(rules) => rules,
            Err(_) => Arc::new(CompiledRules::empty()),
        }
    }

    async fn fresh_rules(&self) -> Option<Arc<CompiledRules>> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|cached| Instant::now() < cached.expires_at)
            .map(|cached| Arc::clone(&cached.rules))
    }

    /// Fetch, compile and cache. Callers must hold the refresh gate.
    async fn reload(&self) -> Result<Arc<CompiledRules>, BlocklistError> {
        let Some(source) = &self.source else {
            return Ok(Arc::new(CompiledRules::empty()));
        };

        let timeout = self.settings.fetch_timeout;
        let fetched = match tokio::time::timeout(timeout, source.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(BlocklistError::Timeout(timeout.as_millis() as u64)),
        };
        let compiled = fetched.and_then(|rules| CompiledRules::compile(&rules));

        let (rules, ttl, outcome) = match compiled {
            Ok(rules) => {
                BLOCKLIST_REFRESHES.with_label_values(&["success"]).inc();
                info!(
                    source = source.name(),
                    rules = rules.len(),
                    "Substitution blocklist refreshed"
                );
                let rules = Arc::new(rules);
                (Arc::clone(&rules), self.settings.refresh_interval, Ok(rules))
            }
            Err(e) => {
                BLOCKLIST_REFRESHES.with_label_values(&["failure"]).inc();
                warn!(
                    source = source.name(),
                    error = %e,
                    "Failed to refresh substitution blocklist, leaving URLs unchanged"
                );
                (
                    Arc::new(CompiledRules::empty()),
                    self.settings.failure_retry_interval,
                    Err(e),
                )
            }
        };

        let mut cache = self.cache.write().await;
        *cache = Some(CachedRules {
            rules,
            expires_at: Instant::now() + ttl,
        });
        debug!(ttl_secs = ttl.as_secs(), "Substitution cache updated");

        outcome
    }
}
