//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the indexgate server:
//! - HTTP request metrics (latency, counts, errors)
//! - Registry size (collected dynamically)
//! - Core registry, status and substitution metrics

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "indexgate_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("indexgate_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "indexgate_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Registry Metrics (collected dynamically)
// =============================================================================

/// Registered indexers, enabled or not.
pub static INDEXERS_REGISTERED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "indexgate_indexers_registered",
        "Number of indexers in the registry",
    )
    .unwrap()
});

/// Enabled indexers.
pub static INDEXERS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("indexgate_indexers_active", "Number of enabled indexers").unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Registry
    registry
        .register(Box::new(INDEXERS_REGISTERED.clone()))
        .unwrap();
    registry.register(Box::new(INDEXERS_ACTIVE.clone())).unwrap();

    // Core metrics (eligibility, health reports, substitution)
    for metric in indexgate_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the gauges reflect the registry right now.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let registry = state.registry();
    INDEXERS_REGISTERED.set(registry.len().await as i64);
    INDEXERS_ACTIVE.set(registry.active().await.len() as i64);

    // Refreshes the blocked gauge as a side effect
    state.status_store().blocked_providers().await;
}

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    // Applied twice since adjacent numeric segments share a slash
    let result = NUMERIC_SEGMENT.replace_all(path, "/{id}$1");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_numeric() {
        let path = "/api/v1/indexers/12345";
        assert_eq!(normalize_path(path), "/api/v1/indexers/{id}");
    }

    #[test]
    fn test_normalize_path_numeric_middle() {
        let path = "/api/v1/indexers/12/failure";
        assert_eq!(normalize_path(path), "/api/v1/indexers/{id}/failure");
    }

    #[test]
    fn test_normalize_path_adjacent_numbers() {
        let path = "/api/v1/things/1/2";
        assert_eq!(normalize_path(path), "/api/v1/things/{id}/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/api/v1/health";
        assert_eq!(normalize_path(path), "/api/v1/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        // Access metrics to ensure they're initialized
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics().unwrap();
        assert!(output.contains("indexgate_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        // Prometheus only outputs vectors that have at least one label set
        indexgate_core::metrics::ELIGIBILITY_QUERIES
            .with_label_values(&["rss"])
            .inc_by(0);
        indexgate_core::metrics::INDEXER_REPORTS
            .with_label_values(&["failure"])
            .inc_by(0);
        INDEXERS_REGISTERED.set(0);

        let output = encode_metrics().unwrap();

        assert!(output.contains("indexgate_indexers_registered"));
        assert!(output.contains("indexgate_indexers_blocked"));
        assert!(output.contains("indexgate_eligibility_queries_total"));
        assert!(output.contains("indexgate_indexer_reports_total"));
        assert!(output.contains("indexgate_url_substitutions_total"));
    }
}
