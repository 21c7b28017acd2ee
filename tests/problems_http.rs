mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::app::spawn_test_app;
use common::auth::{admin_token, login_token, unique_user_token};
use common::http::{assert_json_error, call};

fn vote_body(thinking: f64, implementing: f64, quality: f64) -> Option<Value> {
    Some(json!({ "thinking": thinking, "implementing": implementing, "quality": quality }))
}

fn titles(body: &Value) -> Vec<String> {
    body["data"]["problems"]
        .as_array()
        .expect("problem list")
        .iter()
        .map(|p| p["title"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn it_lists_problems_in_title_order() {
    let app = spawn_test_app().await;
    let (_, token) = unique_user_token(&app.app).await;

    let (status, body) = call(&app.app, Method::GET, "/api/problems", None, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body), ["ABC100-D", "CF1A", "CF2B"]);

    let first = &body["data"]["problems"][0];
    assert_eq!(first["difficulty"], "暂无评定");
    assert!(first["stats"].is_null());
    assert_eq!(
        first["link"],
        "https://atcoder.jp/contests/abc100/tasks/abc100_d"
    );
}

#[tokio::test]
async fn it_aggregates_votes_from_two_users() {
    let app = spawn_test_app().await;
    let alice = login_token(&app.app, "alice").await;
    let bob = login_token(&app.app, "bob").await;

    let (status, _) = call(&app.app, Method::PUT, "/api/problems/CF1A/vote", vote_body(1500.0, 1600.0, 2.0), &alice).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app.app, Method::PUT, "/api/problems/CF1A/vote", vote_body(1800.0, 1900.0, 4.0), &bob).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["replaced"], false);

    let (status, body) = call(&app.app, Method::GET, "/api/problems/CF1A", None, &alice).await;
    assert_eq!(status, StatusCode::OK);
    let stats = &body["data"]["stats"];
    assert_eq!(stats["count"], 2);
    assert_eq!(stats["thinking"]["mean"], 1650.0);
    assert_eq!(stats["thinking"]["std"], 150.0);
    assert_eq!(stats["implementing"]["mean"], 1750.0);
    assert_eq!(stats["quality"]["mean"], 3.0);

    let votes = body["data"]["votes"].as_array().unwrap();
    assert_eq!(votes.len(), 2);
    let own = votes.iter().find(|v| v["voter"] == "alice").unwrap();
    let other = votes.iter().find(|v| v["voter"] == "bob").unwrap();
    assert_eq!(own["canDelete"], true);
    assert_eq!(other["canDelete"], false);
    let overall = own["overall"].as_f64().unwrap();
    assert!(overall > 1500.0 && overall < 2000.0);
}

#[tokio::test]
async fn it_second_vote_replaces_first() {
    let app = spawn_test_app().await;
    let token = login_token(&app.app, "carol").await;

    call(&app.app, Method::PUT, "/api/problems/CF2B/vote", vote_body(1200.0, 1300.0, -1.0), &token).await;
    let (status, body) = call(&app.app, Method::PUT, "/api/problems/CF2B/vote", vote_body(2000.0, 2100.0, 5.0), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["replaced"], true);
    assert_eq!(body["data"]["stats"]["count"], 1);

    let votes = app.state.store().get_votes("CF2B");
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].voter, "carol");
    assert_eq!(votes[0].thinking, 2000.0);
    assert_eq!(votes[0].quality, 5.0);
}

#[tokio::test]
async fn it_vote_is_written_to_disk_immediately() {
    let app = spawn_test_app().await;
    let token = login_token(&app.app, "dave").await;

    call(&app.app, Method::PUT, "/api/problems/CF1A/vote", vote_body(1400.0, 1500.0, 0.5), &token).await;
    assert!(!app.state.store().is_dirty());

    let reopened = app.reopen_store();
    let votes = reopened.get_votes("CF1A");
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].voter, "dave");
    assert_eq!(votes[0].quality, 0.5);
}

#[tokio::test]
async fn it_rejects_out_of_range_ratings() {
    let app = spawn_test_app().await;
    let (_, token) = unique_user_token(&app.app).await;

    for body in [
        vote_body(799.0, 1500.0, 0.0),
        vote_body(1500.0, 3501.0, 0.0),
        vote_body(1500.0, 1500.0, 5.5),
    ] {
        let (status, resp) = call(&app.app, Method::PUT, "/api/problems/CF1A/vote", body, &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_json_error(&resp, "VALIDATION_ERROR");
    }
    assert!(app.state.store().get_votes("CF1A").is_empty());
}

#[tokio::test]
async fn it_unknown_problem_is_404() {
    let app = spawn_test_app().await;
    let (_, token) = unique_user_token(&app.app).await;

    let (status, body) = call(&app.app, Method::GET, "/api/problems/NOPE", None, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_json_error(&body, "NOT_FOUND");

    let (status, _) = call(&app.app, Method::PUT, "/api/problems/NOPE/vote", vote_body(1500.0, 1500.0, 0.0), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn it_vote_deletion_respects_ownership() {
    let app = spawn_test_app().await;
    let alice = login_token(&app.app, "alice").await;
    let bob = login_token(&app.app, "bob").await;
    let admin = admin_token(&app.app).await;

    call(&app.app, Method::PUT, "/api/problems/CF1A/vote", vote_body(1500.0, 1500.0, 0.0), &alice).await;
    call(&app.app, Method::PUT, "/api/problems/CF1A/vote", vote_body(1600.0, 1600.0, 0.0), &bob).await;

    let (status, body) = call(&app.app, Method::DELETE, "/api/problems/CF1A/votes/alice", None, &bob).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_json_error(&body, "FORBIDDEN");

    let (status, _) = call(&app.app, Method::DELETE, "/api/problems/CF1A/votes/bob", None, &bob).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app.app, Method::DELETE, "/api/problems/CF1A/votes/alice", None, &admin).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app.app, Method::DELETE, "/api/problems/CF1A/votes/alice", None, &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.state.store().get_votes("CF1A").is_empty());
}

#[tokio::test]
async fn it_sort_preference_is_per_session() {
    let app = spawn_test_app().await;
    let token = login_token(&app.app, "alice").await;
    let other = login_token(&app.app, "bob").await;

    call(&app.app, Method::PUT, "/api/problems/CF2B/vote", vote_body(1000.0, 1000.0, 0.0), &token).await;
    call(&app.app, Method::PUT, "/api/problems/ABC100-D/vote", vote_body(2400.0, 2400.0, 0.0), &token).await;

    let (status, body) = call(&app.app, Method::POST, "/api/session/sort", Some(json!({ "column": "thinking" })), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["column"], "thinking");
    assert_eq!(body["data"]["ascending"], true);

    // 无评分的题目按 0 参与排序
    let (_, body) = call(&app.app, Method::GET, "/api/problems", None, &token).await;
    assert_eq!(titles(&body), ["CF1A", "CF2B", "ABC100-D"]);
    assert_eq!(body["data"]["sort"]["column"], "thinking");

    let (_, body) = call(&app.app, Method::POST, "/api/session/sort", Some(json!({ "column": "thinking" })), &token).await;
    assert_eq!(body["data"]["ascending"], false);
    let (_, body) = call(&app.app, Method::GET, "/api/problems", None, &token).await;
    assert_eq!(titles(&body), ["ABC100-D", "CF2B", "CF1A"]);

    let (_, body) = call(&app.app, Method::GET, "/api/problems", None, &other).await;
    assert_eq!(titles(&body), ["ABC100-D", "CF1A", "CF2B"]);

    let (_, body) = call(&app.app, Method::POST, "/api/session/sort", Some(json!({ "column": null })), &token).await;
    assert!(body["data"]["column"].is_null());
    let (_, body) = call(&app.app, Method::GET, "/api/problems", None, &token).await;
    assert_eq!(titles(&body), ["ABC100-D", "CF1A", "CF2B"]);
}

#[tokio::test]
async fn it_list_reports_colors_for_rated_problems() {
    let app = spawn_test_app().await;
    let token = login_token(&app.app, "alice").await;
    call(&app.app, Method::PUT, "/api/problems/CF1A/vote", vote_body(1500.0, 1500.0, 4.0), &token).await;

    let (_, body) = call(&app.app, Method::GET, "/api/problems", None, &token).await;
    let row = body["data"]["problems"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["title"] == "CF1A")
        .unwrap()
        .clone();
    assert_eq!(row["stats"]["count"], 1);
    assert!(row["colors"]["thinking"].is_string());
    assert!(!row["colors"]["quality"].is_null());
}
