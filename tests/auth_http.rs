mod common;

use axum::http::{Method, StatusCode};

use common::app::spawn_test_app;
use common::auth::{extract_cookie_value, login, login_token, PASSWORD};
use common::http::{assert_json_error, call, request, response_json};

#[tokio::test]
async fn it_first_login_registers_then_logs_in() {
    let app = spawn_test_app().await;

    let (status, _, body) = login(&app.app, "alice", PASSWORD).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["registered"], true);
    assert_eq!(body["data"]["user"]["username"], "alice");
    assert_eq!(body["data"]["user"]["isAdmin"], false);

    let (status, _, body) = login(&app.app, "alice", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["registered"], false);

    let stored = app.state.store().get_user("alice").expect("user persisted");
    assert!(stored.password.starts_with("$argon2"));
    let file = std::fs::read_to_string(app.paths().users).unwrap();
    assert!(file.contains("\"alice\""));
}

#[tokio::test]
async fn it_wrong_password_is_rejected() {
    let app = spawn_test_app().await;
    login_token(&app.app, "bob").await;

    let (status, _, body) = login(&app.app, "bob", "not-the-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_json_error(&body, "AUTH_UNAUTHORIZED");
}

#[tokio::test]
async fn it_invalid_username_is_rejected() {
    let app = spawn_test_app().await;

    let (status, _, body) = login(&app.app, "   ", PASSWORD).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "AUTH_INVALID_USERNAME");

    let (status, _, body) = login(&app.app, "carol", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "AUTH_INVALID_PASSWORD");
}

#[tokio::test]
async fn it_bootstrap_admin_registers_as_admin() {
    let app = spawn_test_app().await;

    let (status, _, body) = login(&app.app, "root", PASSWORD).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["user"]["isAdmin"], true);
}

#[tokio::test]
async fn it_me_requires_session() {
    let app = spawn_test_app().await;

    let resp = request(&app.app, Method::GET, "/api/users/me", None, &[]).await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_json_error(&body, "AUTH_UNAUTHORIZED");

    let token = login_token(&app.app, "dave").await;
    let (status, body) = call(&app.app, Method::GET, "/api/users/me", None, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "dave");
}

#[tokio::test]
async fn it_session_cookie_authenticates() {
    let app = spawn_test_app().await;

    let (_, headers, _) = login(&app.app, "erin", PASSWORD).await;
    let cookie = extract_cookie_value(&headers, "token").expect("token cookie");

    let resp = request(
        &app.app,
        Method::GET,
        "/api/users/me",
        None,
        &[("cookie", format!("token={cookie}"))],
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "erin");
}

#[tokio::test]
async fn it_logout_revokes_session() {
    let app = spawn_test_app().await;
    let token = login_token(&app.app, "frank").await;

    let (status, body) = call(&app.app, Method::POST, "/api/auth/logout", None, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["loggedOut"], true);

    let (status, _) = call(&app.app, Method::GET, "/api/users/me", None, &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn it_login_is_recorded_in_action_log() {
    let app = spawn_test_app().await;
    login_token(&app.app, "grace").await;
    let _ = login(&app.app, "grace", "wrong-password").await;

    let log = std::fs::read_to_string(app.paths().action_log).unwrap();
    assert!(log.contains("\"register\""));
    assert!(log.contains("\"login_failed\""));
}

#[tokio::test]
async fn it_sessions_per_user_stay_within_cap() {
    let app = spawn_test_app().await;
    let first = login_token(&app.app, "heidi").await;

    for _ in 0..13 {
        login_token(&app.app, "heidi").await;
    }
    let latest = login_token(&app.app, "heidi").await;

    let live = app.state.store().count_user_sessions("heidi").unwrap();
    assert_eq!(live, rating_backend::constants::MAX_SESSIONS_PER_USER);

    let (status, _) = call(&app.app, Method::GET, "/api/users/me", None, &first).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(&app.app, Method::GET, "/api/users/me", None, &latest).await;
    assert_eq!(status, StatusCode::OK);
}
