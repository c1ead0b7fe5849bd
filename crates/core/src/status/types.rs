//! Types for indexer health tracking.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::StatusConfig;

/// Failure state of a single indexer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderStatus {
    pub provider_id: u32,
    /// Consecutive failures without a success, capped at the maximum level.
    pub escalation_level: u32,
    /// First failure of the current streak.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_failure: Option<DateTime<Utc>>,
    /// Latest failure of the current streak.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub most_recent_failure: Option<DateTime<Utc>>,
    /// Indexer is skipped until this instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_till: Option<DateTime<Utc>>,
}

impl ProviderStatus {
    /// A clean record with no failures.
    pub fn new(provider_id: u32) -> Self {
        Self {
            provider_id,
            escalation_level: 0,
            initial_failure: None,
            most_recent_failure: None,
            disabled_till: None,
        }
    }

    /// Blocked iff `disabled_till` is set and strictly after `now`.
    pub fn is_blocked_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.disabled_till, Some(till) if till > now)
    }

    /// Forget the failure streak.
    pub fn reset(&mut self) {
        self.escalation_level = 0;
        self.initial_failure = None;
        self.most_recent_failure = None;
        self.disabled_till = None;
    }
}

/// Escalating cooldown: `initial * multiplier^(level - 1)`, capped at `max`.
#[derive(Debug, Clone, PartialEq)]
pub struct EscalationBackoff {
    initial: Duration,
    multiplier: f64,
    max: Duration,
    max_level: u32,
}

impl EscalationBackoff {
    pub fn new(initial: Duration, multiplier: f64, max: Duration, max_level: u32) -> Self {
        Self {
            initial,
            multiplier: multiplier.max(1.0),
            max: max.max(initial),
            max_level: max_level.max(1),
        }
    }

    /// Highest escalation level a streak can reach.
    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Cooldown for an escalation level. Level 0 means no cooldown.
    pub fn cooldown(&self, level: u32) -> Duration {
        if level == 0 {
            return Duration::zero();
        }
        let exponent = level.min(self.max_level) as i32 - 1;
        let secs = self.initial.num_seconds() as f64 * self.multiplier.powi(exponent);
        let max_secs = self.max.num_seconds() as f64;
        if !secs.is_finite() || secs >= max_secs {
            self.max
        } else {
            Duration::seconds(secs as i64)
        }
    }
}

impl Default for EscalationBackoff {
    fn default() -> Self {
        Self::from(&StatusConfig::default())
    }
}

impl From<&StatusConfig> for EscalationBackoff {
    fn from(config: &StatusConfig) -> Self {
        Self::new(
            seconds(config.initial_backoff_secs),
            config.backoff_multiplier,
            seconds(config.max_backoff_secs),
            config.max_escalation_level,
        )
    }
}

/// Out-of-range second counts saturate at the largest representable duration.
fn seconds(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}
