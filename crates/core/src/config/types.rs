use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::indexer::IndexerDefinition;
use crate::substitution::SubstitutionRule;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub substitution: SubstitutionConfig,
    /// Indexer definitions served by the config-backed definition source.
    #[serde(default)]
    pub indexers: Vec<IndexerDefinition>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Failure backoff configuration
///
/// Cooldown after the n-th consecutive failure is
/// `initial_backoff_secs * backoff_multiplier^(n-1)`, capped at `max_backoff_secs`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StatusConfig {
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_secs: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
    #[serde(default = "default_max_escalation_level")]
    pub max_escalation_level: u32,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            initial_backoff_secs: default_initial_backoff(),
            backoff_multiplier: default_backoff_multiplier(),
            max_backoff_secs: default_max_backoff(),
            max_escalation_level: default_max_escalation_level(),
        }
    }
}

fn default_initial_backoff() -> u64 {
    5 * 60
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_backoff() -> u64 {
    24 * 60 * 60
}

fn default_max_escalation_level() -> u32 {
    10
}

/// Where substitution rules come from
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubstitutionSourceKind {
    #[default]
    None,
    Static,
    Http,
}

/// URL substitution configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubstitutionConfig {
    #[serde(default)]
    pub source: SubstitutionSourceKind,
    /// Blocklist URL (required when source = "http")
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_failure_retry")]
    pub failure_retry_secs: u64,
    /// Rules used when source = "static"
    #[serde(default)]
    pub rules: Vec<SubstitutionRule>,
}

impl Default for SubstitutionConfig {
    fn default() -> Self {
        Self {
            source: SubstitutionSourceKind::None,
            url: None,
            fetch_timeout_secs: default_fetch_timeout(),
            refresh_interval_secs: default_refresh_interval(),
            failure_retry_secs: default_failure_retry(),
            rules: Vec::new(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    5
}

fn default_refresh_interval() -> u64 {
    60 * 60
}

fn default_failure_retry() -> u64 {
    5 * 60
}

/// Sanitized config for API responses (indexer settings redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub status: StatusConfig,
    pub substitution: SanitizedSubstitutionConfig,
    pub indexers: Vec<SanitizedIndexer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSubstitutionConfig {
    pub source: SubstitutionSourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub fetch_timeout_secs: u64,
    pub refresh_interval_secs: u64,
    pub failure_retry_secs: u64,
    pub rules_count: usize,
}

/// Indexer definition without its settings (they may hold API keys)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedIndexer {
    pub id: u32,
    pub name: String,
    pub implementation: String,
    pub enabled: bool,
    pub enable_rss: bool,
    pub enable_search: bool,
    pub base_url_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let substitution = &config.substitution;
        Self {
            server: config.server.clone(),
            status: config.status.clone(),
            substitution: SanitizedSubstitutionConfig {
                source: substitution.source,
                url: substitution.url.clone(),
                fetch_timeout_secs: substitution.fetch_timeout_secs,
                refresh_interval_secs: substitution.refresh_interval_secs,
                failure_retry_secs: substitution.failure_retry_secs,
                rules_count: substitution.rules.len(),
            },
            indexers: config
                .indexers
                .iter()
                .map(|d| SanitizedIndexer {
                    id: d.id,
                    name: d.name.clone(),
                    implementation: d.implementation.clone(),
                    enabled: d.enabled,
                    enable_rss: d.enable_rss,
                    enable_search: d.enable_search,
                    base_url_configured: d.base_url().is_some(),
                })
                .collect(),
        }
    }
}
