//! Indexer registry API handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Duration;
use indexgate_core::indexer::DownloadProtocol;
use indexgate_core::{LoadReport, Operation, ProviderInstance, ProviderStatus};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::state::AppState;

/// Longest cooldown a failure report may request.
const MAX_RETRY_AFTER_SECS: u64 = 7 * 24 * 60 * 60;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct IndexerResponse {
    pub id: u32,
    pub name: String,
    pub implementation: String,
    pub protocol: DownloadProtocol,
    pub enabled: bool,
    pub enable_rss: bool,
    pub enable_search: bool,
    pub supports_rss: bool,
    pub supports_search: bool,
    /// Live base URL, after any substitution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProviderStatus>,
}

impl IndexerResponse {
    fn new(instance: &ProviderInstance, status: Option<&ProviderStatus>, blocked: bool) -> Self {
        let definition = instance.definition();
        Self {
            id: definition.id,
            name: definition.name.clone(),
            implementation: definition.implementation.clone(),
            protocol: definition.protocol,
            enabled: definition.enabled,
            enable_rss: definition.enable_rss,
            enable_search: definition.enable_search,
            supports_rss: definition.supports_rss,
            supports_search: definition.supports_search,
            base_url: instance.base_url(),
            blocked,
            status: status.cloned(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IndexersResponse {
    pub indexers: Vec<IndexerResponse>,
}

#[derive(Debug, Deserialize)]
pub struct EligibleQuery {
    #[serde(default = "default_filter_blocked")]
    pub filter_blocked: bool,
}

fn default_filter_blocked() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct EligibleResponse {
    pub operation: Operation,
    pub filter_blocked: bool,
    pub indexers: Vec<IndexerResponse>,
}

#[derive(Debug, Serialize)]
pub struct StatusesResponse {
    pub statuses: Vec<ProviderStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FailureRequest {
    /// Minimum cooldown requested by the indexer (e.g. from `Retry-After`).
    #[serde(default)]
    pub retry_after_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub enabled: bool,
    pub rules: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn not_found(id: u32) -> ApiError {
    error(StatusCode::NOT_FOUND, format!("Indexer {} not found", id))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/indexers
///
/// Every registered indexer with its current health.
pub async fn list_indexers(State(state): State<Arc<AppState>>) -> Json<IndexersResponse> {
    let statuses: HashMap<u32, ProviderStatus> = state
        .status_store()
        .all_statuses()
        .await
        .into_iter()
        .map(|status| (status.provider_id, status))
        .collect();
    let now = state.status_store().now();

    let indexers = state
        .registry()
        .all()
        .await
        .iter()
        .map(|instance| {
            let status = statuses.get(&instance.id());
            let blocked = status.is_some_and(|s| s.is_blocked_at(now));
            IndexerResponse::new(instance, status, blocked)
        })
        .collect();

    Json(IndexersResponse { indexers })
}

/// GET /api/v1/indexers/{id}
pub async fn get_indexer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<IndexerResponse>, ApiError> {
    let instance = state.registry().get(id).await.ok_or_else(|| not_found(id))?;
    let status = state.status_store().status(id).await;
    let blocked = state.status_store().is_blocked(id).await;
    Ok(Json(IndexerResponse::new(&instance, status.as_ref(), blocked)))
}

/// GET /api/v1/indexers/rss?filter_blocked=true
pub async fn eligible_for_rss(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EligibleQuery>,
) -> Json<EligibleResponse> {
    eligible(&state, Operation::Rss, query.filter_blocked).await
}

/// GET /api/v1/indexers/search?filter_blocked=true
pub async fn eligible_for_search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EligibleQuery>,
) -> Json<EligibleResponse> {
    eligible(&state, Operation::Search, query.filter_blocked).await
}

async fn eligible(
    state: &AppState,
    operation: Operation,
    filter_blocked: bool,
) -> Json<EligibleResponse> {
    let instances = state.registry().eligible(operation, filter_blocked).await;

    let store = state.status_store();
    let now = store.now();
    let mut indexers = Vec::with_capacity(instances.len());
    for instance in &instances {
        let status = store.status(instance.id()).await;
        let blocked = status.as_ref().is_some_and(|s| s.is_blocked_at(now));
        indexers.push(IndexerResponse::new(instance, status.as_ref(), blocked));
    }

    Json(EligibleResponse {
        operation,
        filter_blocked,
        indexers,
    })
}

/// GET /api/v1/indexers/blocked
///
/// Indexers currently in a failure cooldown, ordered by id.
pub async fn list_blocked(State(state): State<Arc<AppState>>) -> Json<StatusesResponse> {
    let mut statuses: Vec<_> = state
        .status_store()
        .blocked_providers()
        .await
        .into_values()
        .collect();
    statuses.sort_by_key(|status| status.provider_id);
    Json(StatusesResponse { statuses })
}

/// GET /api/v1/indexers/status
///
/// Every failure record, blocked or not.
pub async fn list_statuses(State(state): State<Arc<AppState>>) -> Json<StatusesResponse> {
    Json(StatusesResponse {
        statuses: state.status_store().all_statuses().await,
    })
}

/// POST /api/v1/indexers/{id}/failure
///
/// Report a failed call. An optional `retry_after_secs` sets a floor on the
/// resulting cooldown.
pub async fn record_failure(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
    body: Option<Json<FailureRequest>>,
) -> Result<Json<ProviderStatus>, ApiError> {
    let instance = state.registry().get(id).await.ok_or_else(|| not_found(id))?;
    let request = body.map(|Json(request)| request).unwrap_or_default();

    let store = state.status_store();
    let now = store.now();
    let status = match request.retry_after_secs {
        Some(secs) => {
            let minimum = Duration::seconds(secs.min(MAX_RETRY_AFTER_SECS) as i64);
            store.record_failure_with_minimum(id, now, minimum).await
        }
        None => store.record_failure(id, now).await,
    };

    info!(
        indexer = instance.name(),
        level = status.escalation_level,
        "Failure reported"
    );
    Ok(Json(status))
}

/// POST /api/v1/indexers/{id}/success
pub async fn record_success(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<ProviderStatus>, ApiError> {
    state.registry().get(id).await.ok_or_else(|| not_found(id))?;

    let store = state.status_store();
    store.record_success(id).await;
    let status = store
        .status(id)
        .await
        .unwrap_or_else(|| ProviderStatus::new(id));
    Ok(Json(status))
}

/// POST /api/v1/indexers/reload
///
/// Re-read every definition from the definition store.
pub async fn reload(State(state): State<Arc<AppState>>) -> Result<Json<LoadReport>, ApiError> {
    match state.registry().reload().await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            warn!(error = %e, "Indexer reload failed");
            Err(error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
        }
    }
}

/// POST /api/v1/substitution/refresh
///
/// Force a blocklist fetch instead of waiting for the cache to expire.
pub async fn refresh_substitution(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let resolver = state.resolver();
    match resolver.refresh().await {
        Ok(rules) => Ok(Json(RefreshResponse {
            enabled: resolver.is_enabled(),
            rules,
        })),
        Err(e) => Err(error(StatusCode::BAD_GATEWAY, e.to_string())),
    }
}
