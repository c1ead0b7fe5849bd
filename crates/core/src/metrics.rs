//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Eligibility queries and the indexers they skip
//! - Failure and success reports fed into the status store
//! - Blocklist refreshes and URL substitutions

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Registry
// =============================================================================

/// Eligibility queries by operation.
pub static ELIGIBILITY_QUERIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "indexgate_eligibility_queries_total",
            "Total eligibility queries",
        ),
        &["operation"], // "rss", "search"
    )
    .unwrap()
});

/// Indexers left out of a filtered query because of a failure cooldown.
pub static INDEXERS_SKIPPED_BLOCKED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "indexgate_indexers_skipped_blocked_total",
            "Indexers skipped because they are in a failure cooldown",
        ),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// Status
// =============================================================================

/// Health reports by result.
pub static INDEXER_REPORTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("indexgate_indexer_reports_total", "Total health reports"),
        &["result"], // "failure", "success"
    )
    .unwrap()
});

/// Indexers blocked at the last blocked-set query.
pub static INDEXERS_BLOCKED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "indexgate_indexers_blocked",
        "Indexers currently in a failure cooldown",
    )
    .unwrap()
});

// =============================================================================
// Substitution
// =============================================================================

/// Blocklist fetches by result.
pub static BLOCKLIST_REFRESHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "indexgate_blocklist_refreshes_total",
            "Total blocklist fetches",
        ),
        &["result"], // "success", "failure"
    )
    .unwrap()
});

/// Base URLs rewritten in live indexer settings.
pub static URL_SUBSTITUTIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "indexgate_url_substitutions_total",
        "Indexer base URLs rewritten from the blocklist",
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Registry
        Box::new(ELIGIBILITY_QUERIES.clone()),
        Box::new(INDEXERS_SKIPPED_BLOCKED.clone()),
        // Status
        Box::new(INDEXER_REPORTS.clone()),
        Box::new(INDEXERS_BLOCKED.clone()),
        // Substitution
        Box::new(BLOCKLIST_REFRESHES.clone()),
        Box::new(URL_SUBSTITUTIONS.clone()),
    ]
}
