//! Types describing configured indexers and what they can do.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Settings key holding an indexer's base URL.
pub const BASE_URL_KEY: &str = "base_url";

/// Protocol an indexer hands its releases out for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum DownloadProtocol {
    #[default]
    Unknown,
    Usenet,
    Torrent,
}

impl DownloadProtocol {
    /// Returns the string representation for API responses and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadProtocol::Unknown => "unknown",
            DownloadProtocol::Usenet => "usenet",
            DownloadProtocol::Torrent => "torrent",
        }
    }
}

/// Capability descriptor declared by an indexer implementation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexerCapabilities {
    pub protocol: DownloadProtocol,
    pub supports_rss: bool,
    pub supports_search: bool,
}

impl IndexerCapabilities {
    pub fn new(protocol: DownloadProtocol, supports_rss: bool, supports_search: bool) -> Self {
        Self {
            protocol,
            supports_rss,
            supports_search,
        }
    }

    /// Whether the implementation supports the given operation.
    pub fn supports(&self, operation: Operation) -> bool {
        match operation {
            Operation::Rss => self.supports_rss,
            Operation::Search => self.supports_search,
        }
    }
}

/// Kind of work a scheduler wants indexers for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Rss,
    Search,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Rss => "rss",
            Operation::Search => "search",
        }
    }
}

/// A configured indexer, as handed over by the definition store.
///
/// `protocol`, `supports_rss` and `supports_search` are characteristics of the
/// implementation and are overwritten from it when an instance is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexerDefinition {
    pub id: u32,
    pub name: String,
    /// Implementation key, e.g. "newznab" or "torznab".
    pub implementation: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub enable_rss: bool,
    #[serde(default = "default_true")]
    pub enable_search: bool,
    #[serde(default)]
    pub protocol: DownloadProtocol,
    #[serde(default)]
    pub supports_rss: bool,
    #[serde(default)]
    pub supports_search: bool,
    /// Implementation specific settings. Only `base_url` is interpreted here.
    #[serde(default)]
    pub settings: Value,
}

fn default_true() -> bool {
    true
}

impl IndexerDefinition {
    /// Whether the operation's flag is set on this definition.
    pub fn is_enabled_for(&self, operation: Operation) -> bool {
        match operation {
            Operation::Rss => self.enable_rss,
            Operation::Search => self.enable_search,
        }
    }

    /// Base URL from the settings, if present and not blank.
    pub fn base_url(&self) -> Option<&str> {
        base_url_of(&self.settings)
    }
}

/// Read a usable base URL out of an opaque settings value.
///
/// Anything other than an object with a non-blank string `base_url` counts as
/// "no base URL".
pub fn base_url_of(settings: &Value) -> Option<&str> {
    settings
        .as_object()?
        .get(BASE_URL_KEY)?
        .as_str()
        .filter(|url| !url.trim().is_empty())
}
