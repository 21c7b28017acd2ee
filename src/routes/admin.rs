use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::auth::AdminUser;
use crate::commands::{execute, AdminCommand};
use crate::constants::{DEFAULT_ACTION_LOG_LIMIT, MAX_ACTION_LOG_LIMIT};
use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::routes::users::UserProfile;
use crate::state::AppState;
use crate::store::operations::action_log::Action;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/command", post(run_command))
        .route("/users", get(list_users))
        .route("/actions", get(recent_actions))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommandRequest {
    command: String,
    #[serde(default)]
    confirm: bool,
}

async fn run_command(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CommandRequest>,
) -> Result<impl IntoResponse, AppError> {
    let command: AdminCommand = req.command.parse()?;

    // 删除用户会重写评分文件，重置密码要做 argon2 哈希，都放到阻塞线程
    let store = state.store_arc();
    let actor = admin.username.clone();
    let confirm = req.confirm;
    let cmd = command.clone();
    let outcome = tokio::task::spawn_blocking(move || execute(&store, &actor, &cmd, confirm))
        .await
        .map_err(|e| AppError::internal(&format!("admin command task failed: {e}")))??;

    state.store().log_action(
        &admin.username,
        Action::AdminCommand,
        format!("{command} changed={}", outcome.changed),
    );
    Ok(ok(outcome))
}

async fn list_users(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let users: Vec<UserProfile> = state
        .store()
        .list_users()
        .iter()
        .map(|(name, user)| UserProfile::new(name, user))
        .collect();
    Ok(ok(users))
}

#[derive(Debug, Deserialize)]
struct ActionsQuery {
    limit: Option<usize>,
}

async fn recent_actions(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ActionsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_ACTION_LOG_LIMIT)
        .clamp(1, MAX_ACTION_LOG_LIMIT);
    Ok(ok(state.store().recent_actions(limit)?))
}
