//! HTTP API against a node backed by temporary RocksDB storage.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use starboard_core::{ChannelId, ContentItem, Notification, ScopeId, UserId};
use starboard_engine::api::build_router;
use starboard_engine::{EngineConfig, NodeConfig, NodeState, Storage};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn setup() -> (Router, Arc<Storage>, TempDir) {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(Storage::open(dir.path()).unwrap());
    let config = NodeConfig {
        data_dir: dir.path().to_path_buf(),
        api_addr: "127.0.0.1:0".parse().unwrap(),
        admin_socket: dir.path().join("admin.sock"),
        engine: EngineConfig::default(),
    };
    let state = Arc::new(NodeState::new(storage.clone(), config));
    (build_router(state), storage, dir)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn endorse(app: &Router, notification: &Notification) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/endorsements")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(notification).unwrap()))
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

fn message(id: &str, author: &str) -> ContentItem {
    ContentItem::new(id, "general", author, "look at this", 1_700_000_000_000)
}

#[tokio::test]
async fn health_endpoints() {
    let (app, _storage, _dir) = setup();

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"OK");

    let (status, _) = get(&app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn endorsement_creates_board_post() {
    let (app, storage, _dir) = setup();
    storage
        .set_destination(&ScopeId::from("g1"), Some(&ChannelId::from("starboard")))
        .unwrap();

    let (status, outcome) = endorse(&app, &Notification::add("g1", "⭐", "u1", message("m1", "a"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "created");
    assert_eq!(outcome["count"], 1);
    assert_eq!(outcome["label"], "1 ⭐");
    let post_id = outcome["post_id"].as_str().unwrap().to_string();

    let (_, outcome) = endorse(&app, &Notification::add("g1", "⭐", "u2", message("m1", "a"))).await;
    assert_eq!(outcome["outcome"], "updated");
    assert_eq!(outcome["sync"], "applied");

    let (status, post) = get(&app, &format!("/api/v1/posts/{}", post_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post["channel_id"], "starboard");
    assert_eq!(post["content"]["label"], "2 ⭐");
    assert_eq!(post["content"]["text"], "look at this");
}

#[tokio::test]
async fn rejections_are_reported() {
    let (app, storage, _dir) = setup();

    let (status, outcome) = endorse(&app, &Notification::add("g1", "⭐", "u1", message("m1", "a"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "rejected");
    assert_eq!(outcome["reason"], "no_destination");

    storage
        .set_destination(&ScopeId::from("g1"), Some(&ChannelId::from("starboard")))
        .unwrap();
    let (_, outcome) = endorse(&app, &Notification::add("g1", "⭐", "a", message("m1", "a"))).await;
    assert_eq!(outcome["reason"], "self_endorsement");
    assert_eq!(outcome["notice"], "you can't star your own messages.");

    storage.set_blacklisted(&UserId::from("troll"), true).unwrap();
    let (_, outcome) = endorse(&app, &Notification::add("g1", "⭐", "troll", message("m1", "a"))).await;
    assert_eq!(outcome["reason"], "blacklisted");
    assert_eq!(outcome["notice"], Value::Null);
}

#[tokio::test]
async fn malformed_notification_is_client_error() {
    let (app, _storage, _dir) = setup();

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/endorsements")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"action":"add"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn board_view_orders_by_count() {
    let (app, storage, _dir) = setup();
    storage
        .set_destination(&ScopeId::from("g1"), Some(&ChannelId::from("starboard")))
        .unwrap();

    for user in ["u1", "u2", "u3"] {
        endorse(&app, &Notification::add("g1", "⭐", user, message("popular", "a"))).await;
    }
    endorse(&app, &Notification::add("g1", "⭐", "u1", message("quiet", "b"))).await;

    let (status, board) = get(&app, "/api/v1/scopes/g1/board").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["destination"], "starboard");

    let entries = board["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["item_id"], "popular");
    assert_eq!(entries[0]["count"], 3);
    assert_eq!(entries[0]["tier"], 1);
    assert_eq!(entries[1]["item_id"], "quiet");
}

#[tokio::test]
async fn unknown_resources_are_not_found() {
    let (app, _storage, _dir) = setup();

    let (status, _) = get(&app, "/api/v1/scopes/nowhere/board").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, "/api/v1/posts/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn withdrawn_item_leaves_the_board() {
    let (app, storage, _dir) = setup();
    storage
        .set_destination(&ScopeId::from("g1"), Some(&ChannelId::from("starboard")))
        .unwrap();

    let (_, outcome) = endorse(&app, &Notification::add("g1", "⭐", "u1", message("m1", "a"))).await;
    let post_id = outcome["post_id"].as_str().unwrap().to_string();

    let (_, outcome) = endorse(&app, &Notification::remove("g1", "⭐", "u1", message("m1", "a"))).await;
    assert_eq!(outcome["outcome"], "removed");
    assert_eq!(outcome["sync"], "applied");

    let (status, _) = get(&app, &format!("/api/v1/posts/{}", post_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, board) = get(&app, "/api/v1/scopes/g1/board").await;
    assert_eq!(status, StatusCode::OK);
    assert!(board["entries"].as_array().unwrap().is_empty());
}
