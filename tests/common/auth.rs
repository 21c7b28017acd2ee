use axum::http::{HeaderMap, Method, StatusCode};
use axum::Router;
use serde_json::Value;

use super::app::BOOTSTRAP_ADMIN;
use super::http::{request, response_json};

pub const PASSWORD: &str = "Passw0rd!";

/// 从 Set-Cookie header 中提取指定 cookie 的值
pub fn extract_cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all("set-cookie")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|s| s.strip_prefix(&format!("{cookie_name}=")))
        .map(|rest| rest.split(';').next().unwrap_or("").to_string())
        .find(|val| !val.is_empty())
}

pub async fn login(
    app: &Router,
    username: &str,
    password: &str,
) -> (StatusCode, HeaderMap, Value) {
    let resp = request(
        app,
        Method::POST,
        "/api/auth/login",
        Some(serde_json::json!({ "username": username, "password": password })),
        &[],
    )
    .await;
    response_json(resp).await
}

/// Log in (registering on first use) and return the access token.
pub async fn login_token(app: &Router, username: &str) -> String {
    let (status, _, body) = login(app, username, PASSWORD).await;
    assert!(status.is_success(), "login failed: {body}");
    body["data"]["accessToken"]
        .as_str()
        .expect("access token in login response")
        .to_string()
}

pub async fn unique_user_token(app: &Router) -> (String, String) {
    let username = format!("user-{}", &uuid::Uuid::new_v4().simple().to_string()[..12]);
    let token = login_token(app, &username).await;
    (username, token)
}

pub async fn admin_token(app: &Router) -> String {
    login_token(app, BOOTSTRAP_ADMIN).await
}

pub fn auth_header(token: &str) -> String {
    format!("Bearer {token}")
}
