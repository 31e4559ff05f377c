//! Collaborators supplied by the hosting platform.
//!
//! The engine does not know how scopes configure their board channel, who is
//! blacklisted, or how a notice reaches a user. Hosts plug those in through
//! the traits here. In-memory implementations are provided for tests and
//! simple embeddings; the RocksDB [`Storage`](crate::storage::Storage)
//! implements the lookup traits for the node.

use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use starboard_core::{ChannelId, ScopeId, UserId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Mutex;
use tokio::sync::RwLock;

/// Resolves the board channel of a scope.
#[async_trait]
pub trait DestinationResolver: Send + Sync {
    /// The configured board channel, or `None` if the scope has none.
    async fn board_destination(&self, scope_id: &ScopeId) -> Result<Option<ChannelId>>;
}

/// Global endorser blacklist.
#[async_trait]
pub trait Blacklist: Send + Sync {
    async fn is_blacklisted(&self, user_id: &UserId) -> Result<bool>;
}

/// Delivers transient user-facing notices.
#[async_trait]
pub trait NoticeSink: Send + Sync {
    async fn notify(&self, notice: &Notice) -> Result<()>;
}

/// A short message addressed to one user in the channel they acted in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub scope_id: ScopeId,
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub text: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<@{}>, {}", self.user_id, self.text)
    }
}

/// Blacklist with no members.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBlacklist;

#[async_trait]
impl Blacklist for NoBlacklist {
    async fn is_blacklisted(&self, _user_id: &UserId) -> Result<bool> {
        Ok(false)
    }
}

/// Notice sink that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotices;

#[async_trait]
impl NoticeSink for LogNotices {
    async fn notify(&self, notice: &Notice) -> Result<()> {
        tracing::info!(
            scope = %notice.scope_id,
            channel = %notice.channel_id,
            "notice: {}",
            notice
        );
        Ok(())
    }
}

/// Notice sink that records everything it is given.
#[derive(Debug, Default)]
pub struct MemoryNotices {
    sent: Mutex<Vec<Notice>>,
}

impl MemoryNotices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices delivered so far.
    pub fn sent(&self) -> Vec<Notice> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl NoticeSink for MemoryNotices {
    async fn notify(&self, notice: &Notice) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notice.clone());
        Ok(())
    }
}

/// In-memory board destinations and blacklist.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    destinations: RwLock<HashMap<ScopeId, ChannelId>>,
    blacklist: RwLock<HashSet<UserId>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) the board channel of a scope.
    pub async fn set_destination(&self, scope_id: impl Into<ScopeId>, channel: impl Into<ChannelId>) {
        self.destinations
            .write()
            .await
            .insert(scope_id.into(), channel.into());
    }

    pub async fn clear_destination(&self, scope_id: &ScopeId) {
        self.destinations.write().await.remove(scope_id);
    }

    pub async fn blacklist(&self, user_id: impl Into<UserId>) {
        self.blacklist.write().await.insert(user_id.into());
    }

    pub async fn unblacklist(&self, user_id: &UserId) {
        self.blacklist.write().await.remove(user_id);
    }
}

#[async_trait]
impl DestinationResolver for MemoryDirectory {
    async fn board_destination(&self, scope_id: &ScopeId) -> Result<Option<ChannelId>> {
        Ok(self.destinations.read().await.get(scope_id).cloned())
    }
}

#[async_trait]
impl Blacklist for MemoryDirectory {
    async fn is_blacklisted(&self, user_id: &UserId) -> Result<bool> {
        Ok(self.blacklist.read().await.contains(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn directory_lookups() {
        let dir = MemoryDirectory::new();
        let scope = ScopeId::from("g1");
        assert_eq!(dir.board_destination(&scope).await.unwrap(), None);

        dir.set_destination("g1", "starboard").await;
        assert_eq!(
            dir.board_destination(&scope).await.unwrap(),
            Some(ChannelId::from("starboard"))
        );
        dir.clear_destination(&scope).await;
        assert_eq!(dir.board_destination(&scope).await.unwrap(), None);

        let troll = UserId::from("troll");
        dir.blacklist("troll").await;
        assert!(dir.is_blacklisted(&troll).await.unwrap());
        dir.unblacklist(&troll).await;
        assert!(!dir.is_blacklisted(&troll).await.unwrap());
    }

    #[test]
    fn notice_mentions_user() {
        let notice = Notice {
            scope_id: ScopeId::from("g1"),
            channel_id: ChannelId::from("general"),
            user_id: UserId::from("42"),
            text: "you can't star your own messages.".to_string(),
        };
        assert_eq!(notice.to_string(), "<@42>, you can't star your own messages.");
    }
}
