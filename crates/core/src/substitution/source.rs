//! Blocklist sources.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::types::{BlocklistError, BlocklistSource, SubstitutionRule};

/// Fetches rules as a JSON array from a remote service.
pub struct HttpBlocklistSource {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpBlocklistSource {
    /// Create a source for `url`; every request is bounded by `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, BlocklistError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BlocklistError::ConnectionFailed(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl BlocklistSource for HttpBlocklistSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self) -> Result<Vec<SubstitutionRule>, BlocklistError> {
        debug!(url = %self.url, "Fetching substitution blocklist");

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                BlocklistError::Timeout(self.timeout.as_millis() as u64)
            } else {
                BlocklistError::ConnectionFailed(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(BlocklistError::Http(response.status().as_u16()));
        }

        response
            .json::<Vec<SubstitutionRule>>()
            .await
            .map_err(|e| BlocklistError::Parse(e.to_string()))
    }
}

/// Rules fixed at construction, typically from the configuration file.
#[derive(Debug, Clone, Default)]
pub struct StaticBlocklistSource {
    rules: Vec<SubstitutionRule>,
}

impl StaticBlocklistSource {
    pub fn new(rules: Vec<SubstitutionRule>) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl BlocklistSource for StaticBlocklistSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self) -> Result<Vec<SubstitutionRule>, BlocklistError> {
        Ok(self.rules.clone())
    }
}
