use axum::extract::State;
use axum::http::{header::SET_COOKIE, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{
    clear_session_cookie, hash_password, hash_token, needs_rehash, session_cookie,
    sign_jwt_for_user, verify_password, AuthUser,
};
use crate::constants::MAX_SESSIONS_PER_USER;
use crate::extractors::JsonBody;
use crate::rating::ranking::SortPreference;
use crate::response::{created, ok, AppError};
use crate::routes::users::UserProfile;
use crate::state::AppState;
use crate::store::operations::action_log::Action;
use crate::store::operations::sessions::Session;
use crate::store::operations::users::User;
use crate::store::unix_timestamp;
use crate::validation::{validate_password, validate_username};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub registered: bool,
    pub user: UserProfile,
}

fn issue_session(username: &str, state: &AppState) -> Result<String, AppError> {
    if let Err(e) = state
        .store()
        .cleanup_oldest_user_sessions(username, MAX_SESSIONS_PER_USER.saturating_sub(1))
    {
        tracing::warn!(username, error = %e, "清理多余会话失败");
    }

    let hours = state.config().jwt_expires_in_hours;
    let token = sign_jwt_for_user(username, &state.config().jwt_secret, hours)?;
    let now = Utc::now();
    state.store().create_session(&Session {
        token_hash: hash_token(&token),
        username: username.to_string(),
        created_at: now,
        expires_at: now + Duration::hours(hours as i64),
        sort: SortPreference::default(),
    })?;
    Ok(token)
}

/// Log in, or register when the username is new.
async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Response, AppError> {
    let username = validate_username(&req.username)
        .map_err(|msg| AppError::bad_request("AUTH_INVALID_USERNAME", msg))?;
    validate_password(&req.password)
        .map_err(|msg| AppError::bad_request("AUTH_INVALID_PASSWORD", msg))?;
    let store = state.store();

    let (user, registered) = match store.get_user(&username) {
        Some(existing) => {
            if !verify_password(&req.password, &existing.password)? {
                store.log_action(&username, Action::LoginFailed, "");
                return Err(AppError::unauthorized("密码错误，请重试"));
            }
            if existing.banned {
                store.log_action(&username, Action::LoginBanned, "");
                return Err(AppError::banned());
            }

            let rehashed = if needs_rehash(&existing.password) {
                Some(hash_password(&req.password)?)
            } else {
                None
            };
            let user = store.update_user(&username, |u| {
                u.last_login = unix_timestamp();
                if let Some(digest) = rehashed {
                    u.password = digest;
                }
            })?;
            store.log_action(&username, Action::LoginSuccess, "");
            (user, false)
        }
        None => {
            let user = User {
                is_admin: store.is_listed_admin(&username),
                ..User::new(hash_password(&req.password)?)
            };
            store.create_user(&username, user.clone())?;
            store.log_action(&username, Action::Register, "");
            tracing::info!(username = %username, "New user registered");
            (user, true)
        }
    };

    let token = issue_session(&username, &state)?;
    let payload = AuthResponse {
        access_token: token.clone(),
        registered,
        user: UserProfile::new(&username, &user),
    };

    let mut response = if registered {
        created(payload).into_response()
    } else {
        ok(payload).into_response()
    };
    append_set_cookie(
        &mut response,
        &session_cookie(&token, state.config().jwt_expires_in_hours),
    )?;
    Ok(response)
}

async fn logout(auth: AuthUser, State(state): State<AppState>) -> Result<Response, AppError> {
    state.store().delete_session(&auth.token_hash)?;
    state.store().log_action(&auth.username, Action::Logout, "");

    let mut response = ok(serde_json::json!({"loggedOut": true})).into_response();
    append_set_cookie(&mut response, &clear_session_cookie())?;
    Ok(response)
}

fn append_set_cookie(response: &mut Response, cookie: &str) -> Result<(), AppError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| AppError::internal(&format!("cookie header invalid: {e}")))?;
    response.headers_mut().append(SET_COOKIE, value);
    Ok(())
}
