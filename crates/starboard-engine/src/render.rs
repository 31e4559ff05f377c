//! Board renderer/sync.
//!
//! Mirrors board entries onto an external surface through a
//! [`BoardTransport`]. The transport has no transactions, so each operation
//! is a small saga:
//!
//! - **create**: a failure is returned to the caller, which abandons the
//!   transition without touching state.
//! - **update**: fetch, then edit. A missing post (deleted by a moderator)
//!   is logged and skipped.
//! - **delete**: fetch, then delete. A post that cannot be fetched counts as
//!   already deleted.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use starboard_core::{BoardEntry, ChannelId, ContentItem, ItemId, PostId, UserId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// What a board post shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContent {
    /// Tier label, e.g. `"7 🌟"`
    pub label: String,

    pub item_id: ItemId,

    pub source_channel_id: ChannelId,

    pub author_id: UserId,

    pub text: String,

    pub image_url: Option<String>,

    /// Unix millis of the source content
    pub timestamp: u64,
}

impl PostContent {
    /// Content for a post about to be created from live source content.
    pub fn from_item(item: &ContentItem, image_url: Option<String>, label: String) -> Self {
        Self {
            label,
            item_id: item.id.clone(),
            source_channel_id: item.channel_id.clone(),
            author_id: item.author_id.clone(),
            text: item.text.clone(),
            image_url,
            timestamp: item.created_at,
        }
    }

    /// Content for an existing entry. Uses the creation-time snapshot only.
    pub fn from_entry(item_id: &ItemId, entry: &BoardEntry, label: String) -> Self {
        Self {
            label,
            item_id: item_id.clone(),
            source_channel_id: entry.source_channel_id.clone(),
            author_id: entry.author_id.clone(),
            text: entry.snapshot_text.clone(),
            image_url: entry.snapshot_image_url.clone(),
            timestamp: entry.snapshot_timestamp,
        }
    }

    /// Header line: label, source channel and item id.
    pub fn header(&self) -> String {
        format!("{} <#{}> ID: {}", self.label, self.source_channel_id, self.item_id)
    }
}

/// A post as stored on the board surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardPost {
    pub id: PostId,
    pub channel_id: ChannelId,
    pub content: PostContent,
}

/// Write access to the board surface.
///
/// `edit_post` and `delete_post` report a missing target as `Ok(false)`;
/// `Err` is reserved for transport failures.
#[async_trait]
pub trait BoardTransport: Send + Sync {
    async fn create_post(&self, channel_id: &ChannelId, content: &PostContent) -> Result<PostId>;

    async fn fetch_post(&self, post_id: &PostId) -> Result<Option<BoardPost>>;

    async fn edit_post(&self, post_id: &PostId, content: &PostContent) -> Result<bool>;

    async fn delete_post(&self, post_id: &PostId) -> Result<bool>;
}

/// How an update or delete went on the board surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// The change was applied
    Applied,
    /// The post was already gone
    Missing,
    /// The transport failed; the board may be stale
    Failed,
}

/// Applies board entry transitions to the board surface.
#[derive(Clone)]
pub struct BoardRenderer {
    transport: Arc<dyn BoardTransport>,
}

impl BoardRenderer {
    pub fn new(transport: Arc<dyn BoardTransport>) -> Self {
        Self { transport }
    }

    /// Create a board post. The caller abandons the transition on `Err`.
    pub async fn create(&self, channel_id: &ChannelId, content: &PostContent) -> Result<PostId> {
        let post_id = self.transport.create_post(channel_id, content).await?;
        tracing::info!(
            post = %post_id,
            channel = %channel_id,
            item = %content.item_id,
            "board post created ({})",
            content.label
        );
        Ok(post_id)
    }

    /// Bring an existing post up to date.
    pub async fn update(&self, post_id: &PostId, content: &PostContent) -> SyncStatus {
        match self.transport.fetch_post(post_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::warn!(post = %post_id, "board post missing, skipping edit");
                return SyncStatus::Missing;
            }
            Err(e) => {
                tracing::warn!(post = %post_id, "failed to fetch board post: {}", e);
                return SyncStatus::Failed;
            }
        }

        match self.transport.edit_post(post_id, content).await {
            Ok(true) => {
                tracing::debug!(post = %post_id, "board post now {}", content.label);
                SyncStatus::Applied
            }
            Ok(false) => {
                tracing::warn!(post = %post_id, "board post vanished before edit");
                SyncStatus::Missing
            }
            Err(e) => {
                tracing::warn!(post = %post_id, "failed to edit board post: {}", e);
                SyncStatus::Failed
            }
        }
    }

    /// Remove a post from the board.
    pub async fn delete(&self, post_id: &PostId) -> SyncStatus {
        match self.transport.fetch_post(post_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::debug!(post = %post_id, "board post already gone");
                return SyncStatus::Missing;
            }
            Err(e) => {
                tracing::debug!(post = %post_id, "board post unreachable, treating as deleted: {}", e);
                return SyncStatus::Missing;
            }
        }

        match self.transport.delete_post(post_id).await {
            Ok(true) => {
                tracing::info!(post = %post_id, "board post deleted");
                SyncStatus::Applied
            }
            Ok(false) => SyncStatus::Missing,
            Err(e) => {
                tracing::error!(post = %post_id, "failed to delete board post, it is now orphaned: {}", e);
                SyncStatus::Failed
            }
        }
    }
}

/// Board surface kept in memory.
///
/// Supports failure injection and artificial latency so tests can drive the
/// saga branches and force task interleaving.
#[derive(Debug, Default)]
pub struct MemoryBoard {
    posts: RwLock<HashMap<PostId, BoardPost>>,
    next_id: AtomicU64,
    created: AtomicU64,
    fail_creates: AtomicBool,
    fail_edits: AtomicBool,
    latency: Option<Duration>,
}

impl MemoryBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: sleep this long inside every transport call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make `create_post` fail until reset.
    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    /// Make `edit_post` fail until reset.
    pub fn fail_edits(&self, fail: bool) {
        self.fail_edits.store(fail, Ordering::SeqCst);
    }

    /// Total posts ever created.
    pub fn created_count(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }

    /// Posts currently on the board.
    pub async fn posts(&self) -> Vec<BoardPost> {
        self.posts.read().await.values().cloned().collect()
    }

    pub async fn post(&self, post_id: &PostId) -> Option<BoardPost> {
        self.posts.read().await.get(post_id).cloned()
    }

    /// Delete a post behind the engine's back, as a moderator would.
    pub async fn remove_externally(&self, post_id: &PostId) -> bool {
        self.posts.write().await.remove(post_id).is_some()
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl BoardTransport for MemoryBoard {
    async fn create_post(&self, channel_id: &ChannelId, content: &PostContent) -> Result<PostId> {
        self.pause().await;
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(Error::Transport(format!("cannot post in {}", channel_id)));
        }
        let id = PostId::new(format!("post-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1));
        let post = BoardPost {
            id: id.clone(),
            channel_id: channel_id.clone(),
            content: content.clone(),
        };
        self.posts.write().await.insert(id.clone(), post);
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn fetch_post(&self, post_id: &PostId) -> Result<Option<BoardPost>> {
        self.pause().await;
        Ok(self.posts.read().await.get(post_id).cloned())
    }

    async fn edit_post(&self, post_id: &PostId, content: &PostContent) -> Result<bool> {
        self.pause().await;
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(Error::Transport(format!("cannot edit {}", post_id)));
        }
        match self.posts.write().await.get_mut(post_id) {
            Some(post) => {
                post.content = content.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_post(&self, post_id: &PostId) -> Result<bool> {
        self.pause().await;
        Ok(self.posts.write().await.remove(post_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(label: &str) -> PostContent {
        let item = ContentItem::new("m1", "general", "author", "hello", 7);
        PostContent::from_item(&item, None, label.to_string())
    }

    fn renderer() -> (Arc<MemoryBoard>, BoardRenderer) {
        let board = Arc::new(MemoryBoard::new());
        let renderer = BoardRenderer::new(board.clone());
        (board, renderer)
    }

    #[test]
    fn header_format() {
        assert_eq!(content("3 ⭐").header(), "3 ⭐ <#general> ID: m1");
    }

    #[tokio::test]
    async fn create_then_update() {
        let (board, renderer) = renderer();
        let id = renderer
            .create(&ChannelId::from("starboard"), &content("1 ⭐"))
            .await
            .unwrap();

        assert_eq!(renderer.update(&id, &content("2 ⭐")).await, SyncStatus::Applied);
        assert_eq!(board.post(&id).await.unwrap().content.label, "2 ⭐");
    }

    #[tokio::test]
    async fn create_failure_surfaces() {
        let (board, renderer) = renderer();
        board.fail_creates(true);
        let result = renderer
            .create(&ChannelId::from("starboard"), &content("1 ⭐"))
            .await;
        assert!(matches!(result, Err(Error::Transport(_))));
        assert_eq!(board.created_count(), 0);
    }

    #[tokio::test]
    async fn update_of_missing_post_is_skipped() {
        let (board, renderer) = renderer();
        let id = renderer
            .create(&ChannelId::from("starboard"), &content("1 ⭐"))
            .await
            .unwrap();
        board.remove_externally(&id).await;

        assert_eq!(renderer.update(&id, &content("2 ⭐")).await, SyncStatus::Missing);
        assert!(board.posts().await.is_empty());
    }

    #[tokio::test]
    async fn edit_failure_reported() {
        let (board, renderer) = renderer();
        let id = renderer
            .create(&ChannelId::from("starboard"), &content("1 ⭐"))
            .await
            .unwrap();
        board.fail_edits(true);
        assert_eq!(renderer.update(&id, &content("2 ⭐")).await, SyncStatus::Failed);
        assert_eq!(board.post(&id).await.unwrap().content.label, "1 ⭐");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (board, renderer) = renderer();
        let id = renderer
            .create(&ChannelId::from("starboard"), &content("1 ⭐"))
            .await
            .unwrap();

        assert_eq!(renderer.delete(&id).await, SyncStatus::Applied);
        assert_eq!(renderer.delete(&id).await, SyncStatus::Missing);
        assert!(board.posts().await.is_empty());
    }
}
