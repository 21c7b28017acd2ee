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
    let store = state.store();
    Json(serde_json::json!({
        "status": "ok",
        "uptimeSecs": state.uptime_secs(),
        "store": {
            "users": store.count_users(),
            "problems": store.list_problems().len(),
            "dirty": store.is_dirty(),
            "lastSavedAt": store.last_saved_at(),
        }
    }))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Ready once the session tree answers.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().sessions.first() {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::error!(error = %e, "Session store not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
