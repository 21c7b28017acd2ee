use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::store::operations::users::User;

pub fn router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

/// A user without the password digest.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub username: String,
    pub is_admin: bool,
    pub banned: bool,
    pub tag_permissions: Vec<String>,
    pub created_at: f64,
    pub last_login: f64,
}

impl UserProfile {
    pub fn new(username: &str, user: &User) -> Self {
        Self {
            username: username.to_string(),
            is_admin: user.is_admin,
            banned: user.banned,
            tag_permissions: user.tag_permissions.clone(),
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}

async fn me(auth: AuthUser) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(ok(UserProfile::new(&auth.username, &auth.user)))
}
