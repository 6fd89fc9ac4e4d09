//! Health Check Endpoints
//!
//! - /health/live - Liveness probe
//! - /health/ready - Readiness probe (includes a store connectivity check)

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::storage::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Up,
    Down,
}

/// Individual health check result
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub duration_ms: u64,
}

/// Probe response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub uptime_seconds: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<HealthCheck>,
}

/// Health service state
#[derive(Clone)]
pub struct HealthState {
    pub store: Option<Arc<dyn KeyValueStore>>,
    pub version: Option<String>,
    pub started_at: DateTime<Utc>,
    ready: Arc<AtomicBool>,
}

impl HealthState {
    pub fn new(store: Option<Arc<dyn KeyValueStore>>, version: Option<String>) -> Self {
        Self {
            store,
            version,
            started_at: Utc::now(),
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Mark the service as ready
    pub fn set_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }
}

async fn check_store(store: &dyn KeyValueStore) -> HealthCheck {
    let start = Instant::now();
    let result = store.ping().await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => HealthCheck {
            name: format!("store:{}", store.table()),
            status: HealthStatus::Up,
            message: None,
            duration_ms,
        },
        Err(e) => HealthCheck {
            name: format!("store:{}", store.table()),
            status: HealthStatus::Down,
            message: Some(e.to_string()),
            duration_ms,
        },
    }
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive", body = ProbeResponse)
    )
)]
pub async fn get_liveness(State(state): State<HealthState>) -> Json<ProbeResponse> {
    Json(ProbeResponse {
        status: HealthStatus::Up,
        timestamp: Utc::now(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
        checks: Vec::new(),
    })
}

/// Readiness probe
///
/// 503 until startup completes, or while the store is unreachable.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready", body = ProbeResponse),
        (status = 503, description = "Service is not ready", body = ProbeResponse)
    )
)]
pub async fn get_readiness(State(state): State<HealthState>) -> Response {
    let mut checks = Vec::new();
    let mut status = if state.is_ready() { HealthStatus::Up } else { HealthStatus::Down };

    if let Some(store) = &state.store {
        let check = check_store(store.as_ref()).await;
        if check.status == HealthStatus::Down {
            status = HealthStatus::Down;
        }
        checks.push(check);
    }

    let status_code = match status {
        HealthStatus::Up => StatusCode::OK,
        HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    };

    let body = ProbeResponse {
        status,
        timestamp: Utc::now(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
        checks,
    };

    (status_code, Json(body)).into_response()
}

/// Create the health router
pub fn health_router(state: HealthState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(get_liveness))
        .routes(routes!(get_readiness))
        .with_state(state)
}
