use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use cellarhand_agent::ChatRuntime;
use chrono::Utc;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    runtime: Arc<ChatRuntime>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub inventory: HealthCheck,
    pub checked_at: String,
}

pub fn router(runtime: Arc<ChatRuntime>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { runtime })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let inventory = inventory_check(&state.runtime);
    let ready = inventory.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "cellarhand-server runtime initialized".to_string(),
        },
        inventory,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn inventory_check(runtime: &ChatRuntime) -> HealthCheck {
    match runtime.snapshot_info() {
        Some((records, fetched_at)) if records > 0 => HealthCheck {
            status: "ready",
            detail: format!("{records} records fetched at {}", fetched_at.to_rfc3339()),
        },
        Some((_, fetched_at)) => HealthCheck {
            status: "degraded",
            detail: format!("snapshot fetched at {} is empty", fetched_at.to_rfc3339()),
        },
        None => HealthCheck {
            status: "degraded",
            detail: "no inventory snapshot loaded".to_string(),
        },
    }
}
