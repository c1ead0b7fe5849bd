//! Mock blocklist source for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::substitution::{BlocklistError, BlocklistSource, SubstitutionRule};

/// Mock implementation of the BlocklistSource trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable rules
/// - Count fetches for cache assertions
/// - Simulate failures and slow responses
#[derive(Debug, Default)]
pub struct MockBlocklistSource {
    rules: Mutex<Vec<SubstitutionRule>>,
    /// If set, every fetch fails with this message.
    error: Mutex<Option<String>>,
    delay: Mutex<Option<Duration>>,
    fetches: AtomicUsize,
}

impl MockBlocklistSource {
    /// A source that serves no rules.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<SubstitutionRule>) -> Self {
        let source = Self::default();
        source.set_rules(rules);
        source
    }

    pub fn set_rules(&self, rules: Vec<SubstitutionRule>) {
        *self.rules.lock().unwrap_or_else(PoisonError::into_inner) = rules;
    }

    pub fn set_error(&self, error: Option<String>) {
        *self.error.lock().unwrap_or_else(PoisonError::into_inner) = error;
    }

    /// Delay every fetch by `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap_or_else(PoisonError::into_inner) = Some(delay);
    }

    /// Number of fetches started so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlocklistSource for MockBlocklistSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self) -> Result<Vec<SubstitutionRule>, BlocklistError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let error = self
            .error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(message) = error {
            return Err(BlocklistError::ConnectionFailed(message));
        }

        Ok(self
            .rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}
