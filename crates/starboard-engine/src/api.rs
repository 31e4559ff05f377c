//! HTTP API for the starboard node.

use crate::engine::Outcome;
use crate::node::NodeState;
use crate::render::BoardPost;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use starboard_core::{classify, ChannelId, ItemId, Notification, PostId, ScopeId, UserId};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

type AppState = Arc<NodeState>;

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    // CORS layer for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Notification ingress
        .route("/api/v1/endorsements", post(handle_endorsement))
        // Board views
        .route("/api/v1/scopes/:scope_id/board", get(get_board))
        .route("/api/v1/posts/:post_id", get(get_post))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// --- Health endpoints ---

async fn health() -> &'static str {
    "OK"
}

async fn ready() -> &'static str {
    "OK"
}

// --- Notification ingress ---

async fn handle_endorsement(
    State(state): State<AppState>,
    Json(notification): Json<Notification>,
) -> Result<Json<Outcome>, StatusCode> {
    match state.engine.handle(&notification).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => {
            tracing::error!(
                scope = %notification.scope_id,
                item = %notification.item.id,
                "endorsement failed: {}",
                e
            );
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// --- Board endpoints ---

/// One board entry as shown to readers.
#[derive(Debug, Serialize)]
struct BoardEntryView {
    item_id: ItemId,
    post_id: PostId,
    author_id: UserId,
    count: u32,
    tier: u8,
    label: String,
    image_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct BoardView {
    scope_id: ScopeId,
    destination: Option<ChannelId>,
    /// Highest count first
    entries: Vec<BoardEntryView>,
}

async fn get_board(
    State(state): State<AppState>,
    Path(scope_id): Path<String>,
) -> Result<Json<BoardView>, StatusCode> {
    let scope_id = ScopeId::new(scope_id);
    let record = state
        .engine
        .state()
        .scope(&scope_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;
    let destination = state
        .storage
        .get_destination(&scope_id)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let mut entries: Vec<BoardEntryView> = record
        .entries
        .into_iter()
        .map(|(item_id, entry)| {
            let tier = classify(entry.count());
            BoardEntryView {
                item_id,
                post_id: entry.post_id.clone(),
                author_id: entry.author_id.clone(),
                count: entry.count(),
                tier: tier.tier.level,
                label: tier.label,
                image_url: entry.snapshot_image_url.clone(),
            }
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.item_id.cmp(&b.item_id)));

    Ok(Json(BoardView {
        scope_id,
        destination,
        entries,
    }))
}

async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<BoardPost>, StatusCode> {
    match state.storage.get_post(&PostId::new(post_id)) {
        Ok(Some(post)) => Ok(Json(post)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
