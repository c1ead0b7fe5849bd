//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! over a registry driven by a manual clock, a mock blocklist and a mock
//! definition store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use indexgate_core::testing::{ManualClock, MockBlocklistSource, MockDefinitionSource};
use indexgate_core::{Config, IndexerDefinition, ProviderRegistry};
use indexgate_server::{create_router, AppState};

/// Re-export fixtures for test convenience
pub use indexgate_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_failure_blocks() {
///     let fixture = TestFixture::new(vec![fixtures::definition(1, "A", "newznab")]).await;
///
///     fixture.post("/api/v1/indexers/1/failure", json!({})).await;
///     let response = fixture.get("/api/v1/indexers/blocked").await;
///
///     assert_eq!(response.body["statuses"][0]["provider_id"], 1);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Clock used by the status store
    pub clock: Arc<ManualClock>,
    /// Mock blocklist - configure substitution rules
    pub blocklist: Arc<MockBlocklistSource>,
    /// Mock definition store - change what a reload sees
    pub definitions: Arc<MockDefinitionSource>,
    pub registry: Arc<ProviderRegistry>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture whose registry is loaded with `definitions`.
    pub async fn new(definitions: Vec<IndexerDefinition>) -> Self {
        let clock = Arc::new(ManualClock::new(fixtures::t0()));
        let blocklist = Arc::new(MockBlocklistSource::new());
        let store = Arc::new(MockDefinitionSource::new(definitions.clone()));

        let registry = Arc::new(
            fixtures::registry_with(clock.clone(), Some(blocklist.clone()))
                .with_source(store.clone()),
        );
        registry.reload().await.expect("Failed to load definitions");

        let config = Config {
            indexers: definitions,
            ..Config::default()
        };
        let state = Arc::new(AppState::new(config, Arc::clone(&registry)));
        let router = create_router(state);

        Self {
            router,
            clock,
            blocklist,
            definitions: store,
            registry,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
