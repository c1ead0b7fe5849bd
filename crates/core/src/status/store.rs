//! In-memory store of indexer failure state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::types::{EscalationBackoff, ProviderStatus};
use crate::metrics::{INDEXERS_BLOCKED, INDEXER_REPORTS};

/// Process-wide failure state, keyed by indexer id.
///
/// Constructed once at startup and shared (via `Arc`) between the code that
/// reports failures and the registry. Every read-modify-write of a record
/// happens under the write lock, so concurrent failure and success reports for
/// the same indexer resolve as last-writer-wins.
pub struct ProviderStatusStore {
    statuses: RwLock<HashMap<u32, ProviderStatus>>,
    backoff: EscalationBackoff,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ProviderStatusStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderStatusStore")
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl Default for ProviderStatusStore {
    fn default() -> Self {
        Self::new(EscalationBackoff::default())
    }
}

impl ProviderStatusStore {
    /// Create a store using the wall clock.
    pub fn new(backoff: EscalationBackoff) -> Self {
        Self::with_clock(backoff, Arc::new(SystemClock))
    }

    /// Create a store with a custom clock.
    pub fn with_clock(backoff: EscalationBackoff, clock: Arc<dyn Clock>) -> Self {
        Self {
            statuses: RwLock::new(HashMap::new()),
            backoff,
            clock,
        }
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn backoff(&self) -> &EscalationBackoff {
        &self.backoff
    }

    /// Whether the indexer is blocked right now.
    pub async fn is_blocked(&self, provider_id: u32) -> bool {
        self.is_blocked_at(provider_id, self.now()).await
    }

    /// Whether the indexer is blocked at `now`.
    pub async fn is_blocked_at(&self, provider_id: u32, now: DateTime<Utc>) -> bool {
        let statuses = self.statuses.read().await;
        statuses
            .get(&provider_id)
            .map(|s| s.is_blocked_at(now))
            .unwrap_or(false)
    }

    /// All indexers blocked right now.
    pub async fn blocked_providers(&self) -> HashMap<u32, ProviderStatus> {
        let blocked = self.blocked_providers_at(self.now()).await;
        INDEXERS_BLOCKED.set(blocked.len() as i64);
        blocked
    }

    /// All indexers blocked at `now`, fetched under a single lock.
    pub async fn blocked_providers_at(&self, now: DateTime<Utc>) -> HashMap<u32, ProviderStatus> {
        let statuses = self.statuses.read().await;
        statuses
            .iter()
            .filter(|(_, s)| s.is_blocked_at(now))
            .map(|(id, s)| (*id, s.clone()))
            .collect()
    }

    /// Record a failed attempt against an indexer.
    pub async fn record_failure(&self, provider_id: u32, now: DateTime<Utc>) -> ProviderStatus {
        self.record(provider_id, now, None).await
    }

    /// Record a failed attempt, disabling the indexer for at least `minimum`.
    ///
    /// Used when the indexer told us how long to back off (rate limiting).
    pub async fn record_failure_with_minimum(
        &self,
        provider_id: u32,
        now: DateTime<Utc>,
        minimum: Duration,
    ) -> ProviderStatus {
        self.record(provider_id, now, Some(minimum)).await
    }

    async fn record(
        &self,
        provider_id: u32,
        now: DateTime<Utc>,
        minimum: Option<Duration>,
    ) -> ProviderStatus {
        let mut statuses = self.statuses.write().await;
        let status = statuses
            .entry(provider_id)
            .or_insert_with(|| ProviderStatus::new(provider_id));

        if status.escalation_level == 0 {
            status.initial_failure = Some(now);
        }
        status.escalation_level = (status.escalation_level + 1).min(self.backoff.max_level());
        status.most_recent_failure = Some(now);

        let mut cooldown = self.backoff.cooldown(status.escalation_level);
        if let Some(minimum) = minimum {
            cooldown = cooldown.max(minimum);
        }
        let till = now
            .checked_add_signed(cooldown)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        // A pending later cooldown is never shortened
        status.disabled_till = Some(match status.disabled_till {
            Some(existing) if existing > till => existing,
            _ => till,
        });

        INDEXER_REPORTS.with_label_values(&["failure"]).inc();
        warn!(
            indexer_id = provider_id,
            escalation_level = status.escalation_level,
            disabled_till = %status.disabled_till.unwrap_or(till),
            "Indexer failure recorded"
        );

        status.clone()
    }

    /// Record a successful attempt. A single success clears the streak.
    pub async fn record_success(&self, provider_id: u32) {
        let mut statuses = self.statuses.write().await;
        INDEXER_REPORTS.with_label_values(&["success"]).inc();

        let Some(status) = statuses.get_mut(&provider_id) else {
            return;
        };
        if status.escalation_level > 0 || status.disabled_till.is_some() {
            info!(
                indexer_id = provider_id,
                previous_level = status.escalation_level,
                "Indexer recovered"
            );
        } else {
            debug!(indexer_id = provider_id, "Indexer success recorded");
        }
        status.reset();
    }

    /// Status record for an indexer, if it ever failed.
    pub async fn status(&self, provider_id: u32) -> Option<ProviderStatus> {
        self.statuses.read().await.get(&provider_id).cloned()
    }

    /// Every stored record, sorted by indexer id.
    pub async fn all_statuses(&self) -> Vec<ProviderStatus> {
        let statuses = self.statuses.read().await;
        let mut all: Vec<_> = statuses.values().cloned().collect();
        all.sort_by_key(|s| s.provider_id);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ManualClock;

    fn store() -> ProviderStatusStore {
        ProviderStatusStore::new(EscalationBackoff::new(
            Duration::minutes(5),
            2.0,
            Duration::hours(1),
            10,
        ))
    }

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-15T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn test_unknown_provider_not_blocked() {
        let store = store();
        assert!(!store.is_blocked_at(1, t0()).await);
        assert!(store.status(1).await.is_none());
        assert!(store.blocked_providers_at(t0()).await.is_empty());
    }

    #[tokio::test]
    async fn test_failure_blocks_until_cooldown_elapses() {
        let store = store();
        let status = store.record_failure(1, t0()).await;

        assert_eq!(status.escalation_level, 1);
        assert_eq!(status.initial_failure, Some(t0()));
        assert_eq!(status.disabled_till, Some(t0() + Duration::minutes(5)));

        assert!(store.is_blocked_at(1, t0() + Duration::seconds(1)).await);
        assert!(store.is_blocked_at(1, t0() + Duration::minutes(4)).await);
        assert!(!store.is_blocked_at(1, t0() + Duration::minutes(5)).await);
        assert!(!store.is_blocked_at(1, t0() + Duration::minutes(6)).await);
    }

    #[tokio::test]
    async fn test_success_unblocks_immediately() {
        let store = store();
        for _ in 0..4 {
            store.record_failure(1, t0()).await;
        }
        assert!(store.is_blocked_at(1, t0()).await);

        store.record_success(1).await;

        assert!(!store.is_blocked_at(1, t0()).await);
        let status = store.status(1).await.unwrap();
        assert_eq!(status.escalation_level, 0);
        assert!(status.disabled_till.is_none());
        assert!(status.initial_failure.is_none());
    }

    #[tokio::test]
    async fn test_repeated_failures_escalate_and_cap() {
        let store = store();
        let mut previous = Duration::zero();
        let mut now = t0();

        for _ in 0..12 {
            let status = store.record_failure(1, now).await;
            let window = status.disabled_till.unwrap() - now;
            assert!(window >= previous);
            assert!(window <= Duration::hours(1));
            previous = window;
            now += Duration::seconds(30);
        }

        let status = store.status(1).await.unwrap();
        assert_eq!(status.escalation_level, 10);
        assert_eq!(status.initial_failure, Some(t0()));
        assert_eq!(previous, Duration::hours(1));
    }

    #[tokio::test]
    async fn test_minimum_backoff_extends_cooldown() {
        let store = store();
        let status = store
            .record_failure_with_minimum(1, t0(), Duration::hours(2))
            .await;
        assert_eq!(status.disabled_till, Some(t0() + Duration::hours(2)));

        // A regular failure right after must not shorten the pending cooldown
        let status = store.record_failure(1, t0() + Duration::minutes(1)).await;
        assert_eq!(status.disabled_till, Some(t0() + Duration::hours(2)));
    }

    #[tokio::test]
    async fn test_minimum_backoff_smaller_than_escalation() {
        let store = store();
        let status = store
            .record_failure_with_minimum(1, t0(), Duration::seconds(10))
            .await;
        assert_eq!(status.disabled_till, Some(t0() + Duration::minutes(5)));
    }

    #[tokio::test]
    async fn test_blocked_providers_lists_only_blocked() {
        let store = store();
        store.record_failure(1, t0()).await;
        store.record_failure(2, t0() - Duration::hours(2)).await;
        store.record_failure(3, t0()).await;
        store.record_success(3).await;

        let blocked = store.blocked_providers_at(t0()).await;
        assert_eq!(blocked.len(), 1);
        assert!(blocked.contains_key(&1));

        let all = store.all_statuses().await;
        let ids: Vec<_> = all.iter().map(|s| s.provider_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_huge_cooldown_saturates_instead_of_overflowing() {
        let store = ProviderStatusStore::new(EscalationBackoff::new(
            Duration::minutes(1),
            10.0,
            Duration::seconds(9_000_000_000_000),
            100,
        ));

        let mut status = store.record_failure(1, t0()).await;
        for _ in 1..40 {
            status = store.record_failure(1, t0()).await;
        }

        assert_eq!(status.escalation_level, 40);
        assert_eq!(status.disabled_till, Some(DateTime::<Utc>::MAX_UTC));
        assert!(store.is_blocked_at(1, t0() + Duration::days(365 * 100)).await);

        store.record_success(1).await;
        assert!(!store.is_blocked_at(1, t0()).await);
    }

    #[tokio::test]
    async fn test_success_for_unknown_provider_is_noop() {
        let store = store();
        store.record_success(42).await;
        assert!(store.status(42).await.is_none());
    }

    #[tokio::test]
    async fn test_is_blocked_uses_clock() {
        let clock = Arc::new(ManualClock::new(t0()));
        let store = ProviderStatusStore::with_clock(
            EscalationBackoff::new(Duration::minutes(5), 2.0, Duration::hours(1), 10),
            clock.clone(),
        );

        store.record_failure(1, clock.now()).await;
        assert!(store.is_blocked(1).await);
        assert_eq!(store.blocked_providers().await.len(), 1);

        clock.advance(Duration::minutes(5));
        assert!(!store.is_blocked(1).await);
        assert!(store.blocked_providers().await.is_empty());
    }
}
