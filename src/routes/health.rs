use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let schema_version = state.store().schema_version().ok();
    let latency_us = start.elapsed().as_micros() as u64;
    let service = state.progression();

    Json(serde_json::json!({
        "status": "ok",
        "uptimeSecs": state.uptime_secs(),
        "store": {
            "healthy": schema_version.is_some(),
            "schemaVersion": schema_version,
            "latencyUs": latency_us,
        },
        "catalogs": {
            "devotionalDays": service.devotional_catalog().len(),
            "gameQuestions": service.game_catalog().len(),
        },
    }))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// 存储可读且迁移已完成才算就绪
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().schema_version() {
        Ok(version) if version >= crate::store::migrate::LATEST_VERSION => StatusCode::OK,
        Ok(version) => {
            tracing::warn!(version, "Store schema behind, not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(e) => {
            tracing::error!(error = %e, "Store unreadable, not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
