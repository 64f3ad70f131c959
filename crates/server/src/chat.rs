//! Chat and inventory endpoints consumed by the bar-floor UI.
//!
//! - `POST /api/chat`              — one question in, one reply out
//! - `POST /api/inventory/refresh` — fetch a fresh snapshot from the sheet
//! - `GET  /api/inventory/status`  — snapshot presence, size, and age

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cellarhand_agent::{ChatRuntime, SubmitOutcome, SubmitRejection};
use cellarhand_sheet::SheetClient;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Clone)]
pub struct ChatState {
    runtime: Arc<ChatRuntime>,
    sheet: Arc<SheetClient>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponseBody {
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub records: usize,
    pub fetched_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub loaded: bool,
    pub records: usize,
    pub fetched_at: Option<String>,
    pub busy: bool,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

pub fn router(runtime: Arc<ChatRuntime>, sheet: Arc<SheetClient>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/inventory/refresh", post(refresh))
        .route("/api/inventory/status", get(status))
        .with_state(ChatState { runtime, sheet })
}

async fn chat(State(state): State<ChatState>, Json(body): Json<ChatRequestBody>) -> Response {
    match state.runtime.submit(&body.message).await {
        SubmitOutcome::Replied { reply } => {
            (StatusCode::OK, Json(ChatResponseBody { reply })).into_response()
        }
        // Blank input is a no-op, not an error.
        SubmitOutcome::Rejected(SubmitRejection::EmptyMessage) => {
            StatusCode::NO_CONTENT.into_response()
        }
        SubmitOutcome::Rejected(rejection @ SubmitRejection::Busy) => (
            StatusCode::CONFLICT,
            Json(ApiError { error: rejection.user_message().to_string() }),
        )
            .into_response(),
        SubmitOutcome::Rejected(rejection @ SubmitRejection::NoInventory) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError { error: rejection.user_message().to_string() }),
        )
            .into_response(),
    }
}

async fn refresh(State(state): State<ChatState>) -> Response {
    match state.sheet.fetch_inventory().await {
        Ok(snapshot) => {
            let records = snapshot.len();
            let fetched_at = snapshot.fetched_at().to_rfc3339();
            state.runtime.install_snapshot(snapshot);

            info!(
                event_name = "inventory.refresh.ok",
                record_count = records,
                "inventory snapshot refreshed"
            );

            let warning = (records == 0)
                .then_some("Inventory loaded but appears empty. Check the LIVE tab export.");
            (StatusCode::OK, Json(RefreshResponse { records, fetched_at, warning }))
                .into_response()
        }
        Err(cause) => {
            // A failed refresh leaves the inventory unavailable until the
            // next successful one.
            state.runtime.clear_snapshot();
            error!(
                event_name = "inventory.refresh.failed",
                error = %cause,
                "inventory refresh failed"
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiError { error: cause.user_message().to_string() }),
            )
                .into_response()
        }
    }
}

async fn status(State(state): State<ChatState>) -> Json<StatusResponse> {
    let info = state.runtime.snapshot_info();

    Json(StatusResponse {
        loaded: info.is_some(),
        records: info.map(|(records, _)| records).unwrap_or(0),
        fetched_at: info.map(|(_, fetched_at)| fetched_at.to_rfc3339()),
        busy: state.runtime.is_busy(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use cellarhand_agent::{ChatRuntime, CompletionClient, CompletionError, CompletionRequest};
    use cellarhand_core::config::{ChatConfig, SheetConfig};
    use cellarhand_core::{FilterConfig, InventoryRecord, InventorySnapshot};
    use cellarhand_sheet::SheetClient;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use super::router;

    struct CannedClient;

    #[async_trait]
    impl CompletionClient for CannedClient {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
            Ok("Yes, the Felsina.".to_string())
        }
    }

    fn test_router(with_snapshot: bool) -> axum::Router {
        let runtime = Arc::new(ChatRuntime::new(
            Arc::new(CannedClient),
            ChatConfig { max_history_pairs: 6, welcome_message: String::new() },
            FilterConfig::default(),
            0.1,
        ));

        if with_snapshot {
            let records = vec![InventoryRecord::from_value(json!({
                "Name": "Felsina Chianti",
                "Price": "450,-",
                "Stock": "3",
            }))
            .expect("fixture should be an object")];
            runtime.install_snapshot(InventorySnapshot::new(records));
        }

        // Nothing listens on this address; refresh calls fail fast.
        let sheet = SheetClient::new(&SheetConfig {
            export_url: "http://127.0.0.1:1/export".to_string(),
            timeout_secs: 1,
        })
        .expect("sheet client should build");

        router(runtime, Arc::new(sheet))
    }

    fn chat_request(message: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"message": message}).to_string()))
            .expect("request should build")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body should be readable");
        serde_json::from_slice(&bytes).expect("body should be JSON")
    }

    #[tokio::test]
    async fn chat_replies_when_inventory_is_loaded() {
        let response = test_router(true)
            .oneshot(chat_request("do you have chianti?"))
            .await
            .expect("router should respond");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["reply"], "Yes, the Felsina.");
    }

    #[tokio::test]
    async fn blank_messages_are_ignored_with_no_content() {
        let response = test_router(true)
            .oneshot(chat_request("   "))
            .await
            .expect("router should respond");

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn chat_is_unavailable_without_a_snapshot() {
        let response = test_router(false)
            .oneshot(chat_request("anything open?"))
            .await
            .expect("router should respond");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap_or_default().contains("Inventory is not loaded"));
    }

    #[tokio::test]
    async fn status_reports_the_snapshot() {
        let response = test_router(true)
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/inventory/status")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("router should respond");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["loaded"], true);
        assert_eq!(body["records"], 1);
        assert_eq!(body["busy"], false);
    }

    #[tokio::test]
    async fn refresh_failure_marks_the_inventory_unavailable() {
        let router = test_router(true);

        let refresh = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/inventory/refresh")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("router should respond");
        assert_eq!(refresh.status(), StatusCode::SERVICE_UNAVAILABLE);

        let status = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/inventory/status")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("router should respond");
        let body = body_json(status).await;
        assert_eq!(body["loaded"], false);
    }

    #[tokio::test]
    async fn refresh_failure_surfaces_the_staff_warning() {
        let response = test_router(false)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/inventory/refresh")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("router should respond");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap_or_default().contains("Could not load inventory"));
    }
}
