//! Indexer health tracking.
//!
//! Failures reported by the protocol layer disable an indexer for an
//! escalating cooldown window; a single success clears it again.

mod clock;
mod store;
mod types;

pub use clock::{Clock, SystemClock};
pub use store::ProviderStatusStore;
pub use types::*;
