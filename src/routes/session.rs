use axum::extract::State;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::extractors::JsonBody;
use crate::rating::ranking::{SortColumn, SortPreference};
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/sort", post(set_sort))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SortRequest {
    /// `null` restores the default title order.
    column: Option<SortColumn>,
}

/// Selecting the current column flips the direction; another column starts
/// ascending.
async fn set_sort(
    auth: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SortRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let next = match req.column {
        Some(column) => auth.sort.toggle(column),
        None => SortPreference::default(),
    };
    state.store().update_session_sort(&auth.token_hash, next)?;
    Ok(ok(next))
}
