/*!
 * # Health Check Module
 *
 * - Liveness (`/health/live`) - the process answers
 * - Readiness (`/health/ready`) - the database answers a ping
 * - Details (`/health/details`) - component report with uptime
 * - Version (`/health/version`) - build information
 */

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{collections::BTreeMap, sync::Arc, time::Instant};
use tracing::{debug, warn};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

impl HealthStatus {
    fn http_status(self) -> StatusCode {
        match self {
            HealthStatus::Up => StatusCode::OK,
            HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub latency_ms: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub components: BTreeMap<String, ComponentHealth>,
}

#[derive(Clone)]
pub struct HealthState {
    db: Arc<DatabaseConnection>,
    started: Instant,
}

impl HealthState {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            started: Instant::now(),
        }
    }

    async fn database(&self) -> ComponentHealth {
        let start = Instant::now();
        let result = crate::db::check_connection(&self.db).await;
        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        match result {
            Ok(()) => ComponentHealth {
                status: HealthStatus::Up,
                message: None,
                latency_ms,
            },
            Err(e) => {
                warn!("Database health check failed: {}", e);
                ComponentHealth {
                    status: HealthStatus::Down,
                    message: Some(e.response_message()),
                    latency_ms,
                }
            }
        }
    }

    pub async fn report(&self) -> HealthReport {
        let mut components = BTreeMap::new();
        components.insert("database".to_string(), self.database().await);

        let status = if components.values().all(|c| c.status == HealthStatus::Up) {
            HealthStatus::Up
        } else {
            HealthStatus::Down
        };

        HealthReport {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            uptime_seconds: self.started.elapsed().as_secs(),
            components,
        }
    }
}

/// Returns build and version information
pub async fn version_info() -> impl IntoResponse {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "commit": option_env!("GIT_HASH").unwrap_or("unknown"),
        "built": option_env!("BUILD_TIME").unwrap_or("unknown"),
    }))
}

pub async fn liveness_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "alive": true,
            "uptime_seconds": state.started.elapsed().as_secs(),
        })),
    )
}

pub async fn readiness_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    debug!("Readiness check endpoint called");
    let report = state.report().await;
    (
        report.status.http_status(),
        Json(json!({
            "ready": report.status == HealthStatus::Up,
            "timestamp": report.timestamp,
        })),
    )
}

pub async fn detailed_health(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let report = state.report().await;
    (report.status.http_status(), Json(report))
}

/// Health endpoints with their own state, ready to nest under `/health`.
pub fn health_routes(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/", get(readiness_check))
        .route("/live", get(liveness_check))
        .route("/ready", get(readiness_check))
        .route("/details", get(detailed_health))
        .route("/version", get(version_info))
        .with_state(Arc::new(HealthState::new(db)))
}
