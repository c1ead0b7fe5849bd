//! Manually driven clock for testing.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

use crate::status::Clock;

/// A clock that only moves when told to.
///
/// ```rust,ignore
/// let clock = Arc::new(ManualClock::new(Utc::now()));
/// let store = ProviderStatusStore::with_clock(EscalationBackoff::default(), clock.clone());
///
/// store.record_failure(1, clock.now()).await;
/// clock.advance(Duration::minutes(5));
/// assert!(!store.is_blocked(1).await);
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        ManualClock::now(self)
    }
}
