//! Service endpoints outside the entity API: liveness, readiness and build info.

use crate::routes::API_PREFIX;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Serialize)]
struct Status {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    store: Option<&'static str>,
}

async fn health() -> Json<Status> {
    Json(Status { status: "ok", store: None })
}

/// 503 while the document store cannot be reached.
async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Status>) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(Status { status: "ok", store: Some("ok") })),
        Err(err) => {
            tracing::warn!(error = %err, "store ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Status { status: "degraded", store: Some("unavailable") }),
            )
        }
    }
}

async fn version(State(state): State<AppState>) -> Json<Value> {
    let entities: Vec<&str> = state.registry.path_segments();
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "api": API_PREFIX,
        "entities": entities,
    }))
}

/// GET /health, GET /ready, GET /version.
pub fn common_routes_with_ready(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .with_state(state)
}
