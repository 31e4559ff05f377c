//! Board state store.
//!
//! Owns every mutation of aggregation state. Each entry update is a
//! read-modify-write of the whole scope record, serialized per scope so two
//! items of the same scope cannot overwrite each other's changes. The
//! critical section covers store I/O only; renderer calls happen outside it.

use crate::error::{Error, Result};
use crate::locks::KeyedLocks;
use crate::store::ScopeStore;
use starboard_core::{BoardEntry, ItemId, ScopeBoardSettings, ScopeId};
use std::sync::Arc;

/// Entry-level access to per-scope board records.
pub struct BoardState {
    store: Arc<dyn ScopeStore>,
    scope_locks: KeyedLocks<ScopeId>,
}

impl BoardState {
    pub fn new(store: Arc<dyn ScopeStore>) -> Self {
        Self {
            store,
            scope_locks: KeyedLocks::new(),
        }
    }

    /// Load a scope record, creating an empty one on first use.
    pub async fn get_or_create_scope(&self, scope_id: &ScopeId) -> Result<ScopeBoardSettings> {
        self.store.create_if_absent(scope_id).await
    }

    /// Load a scope record without creating it.
    pub async fn scope(&self, scope_id: &ScopeId) -> Result<Option<ScopeBoardSettings>> {
        self.store.get(scope_id).await
    }

    /// Look up one entry.
    pub async fn entry(&self, scope_id: &ScopeId, item_id: &ItemId) -> Result<Option<BoardEntry>> {
        match self.store.get(scope_id).await? {
            Some(mut scope) => checked(scope_id, item_id, scope.entries.remove(item_id)),
            None => Ok(None),
        }
    }

    /// Look up one entry, creating the scope record on first use.
    pub async fn entry_or_create_scope(
        &self,
        scope_id: &ScopeId,
        item_id: &ItemId,
    ) -> Result<Option<BoardEntry>> {
        let mut scope = self.get_or_create_scope(scope_id).await?;
        checked(scope_id, item_id, scope.entries.remove(item_id))
    }

    /// Insert or replace an entry and persist the scope record.
    ///
    /// Entries with no voters or broken count/voter bookkeeping are refused;
    /// an empty entry must go through [`remove_entry`](Self::remove_entry).
    pub async fn upsert_entry(
        &self,
        scope_id: &ScopeId,
        item_id: &ItemId,
        entry: BoardEntry,
    ) -> Result<()> {
        if entry.is_empty() || !entry.is_consistent() {
            return Err(Error::InvalidInput(format!(
                "refusing to store inconsistent entry for {}/{} (count {})",
                scope_id,
                item_id,
                entry.count()
            )));
        }

        let _guard = self.scope_locks.lock(scope_id.clone()).await;
        let mut record = self.store.create_if_absent(scope_id).await?;
        record.entries.insert(item_id.clone(), entry);
        self.store.save(&record).await?;
        tracing::debug!(scope = %scope_id, item = %item_id, "entry persisted");
        Ok(())
    }

    /// Remove an entry and persist the scope record. Returns the removed
    /// entry; removing an absent entry saves nothing.
    pub async fn remove_entry(
        &self,
        scope_id: &ScopeId,
        item_id: &ItemId,
    ) -> Result<Option<BoardEntry>> {
        let _guard = self.scope_locks.lock(scope_id.clone()).await;
        let Some(mut record) = self.store.get(scope_id).await? else {
            return Ok(None);
        };
        let removed = record.entries.remove(item_id);
        if removed.is_some() {
            self.store.save(&record).await?;
            tracing::debug!(scope = %scope_id, item = %item_id, "entry removed");
        }
        Ok(removed)
    }
}

/// Refuse entries whose stored count and voters disagree.
fn checked(
    scope_id: &ScopeId,
    item_id: &ItemId,
    entry: Option<BoardEntry>,
) -> Result<Option<BoardEntry>> {
    match entry {
        Some(entry) if !entry.is_consistent() => {
            tracing::error!(
                scope = %scope_id,
                item = %item_id,
                count = entry.count(),
                "stored entry is corrupt"
            );
            Err(Error::Storage(format!(
                "corrupt entry {}/{}: count {} does not match its voters",
                scope_id,
                item_id,
                entry.count()
            )))
        }
        entry => Ok(entry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use starboard_core::{ChannelId, ContentItem, PostId, UserId};

    fn entry(item: &str, voter: &str) -> BoardEntry {
        let content = ContentItem::new(item, "general", "author", "text", 0);
        BoardEntry::new(
            &content,
            None,
            ChannelId::from("starboard"),
            PostId::new(format!("post-{}", item)),
            UserId::from(voter),
        )
    }

    #[tokio::test]
    async fn upsert_and_remove() {
        let store = Arc::new(MemoryStore::new());
        let state = BoardState::new(store.clone());
        let scope = ScopeId::from("g1");
        let item = ItemId::from("m1");

        state.upsert_entry(&scope, &item, entry("m1", "u1")).await.unwrap();
        assert_eq!(state.entry(&scope, &item).await.unwrap().unwrap().count(), 1);

        let removed = state.remove_entry(&scope, &item).await.unwrap();
        assert!(removed.is_some());
        assert!(state.entry(&scope, &item).await.unwrap().is_none());

        // scope record survives its last entry
        assert!(state.scope(&scope).await.unwrap().is_some());
        assert!(state.remove_entry(&scope, &item).await.unwrap().is_none());
        assert_eq!(store.save_count(), 2);
    }

    #[tokio::test]
    async fn first_use_creates_one_empty_record() {
        let store = Arc::new(MemoryStore::new());
        let state = BoardState::new(store.clone());
        let scope = ScopeId::from("g1");

        assert!(state.get_or_create_scope(&scope).await.unwrap().is_empty());
        assert!(state
            .entry_or_create_scope(&scope, &ItemId::from("m1"))
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.len().await, 1);
        assert_eq!(store.save_count(), 0);
    }

    fn corrupt_record(scope: &str, item: &str) -> ScopeBoardSettings {
        let json = format!(
            r#"{{"scope_id":"{scope}","entries":{{"{item}":{{
                "author_id":"author","source_channel_id":"general",
                "board_channel_id":"starboard","post_id":"post-{item}",
                "snapshot_text":"text","snapshot_image_url":null,
                "snapshot_timestamp":0,"count":0,"voters":["u1"]}}}}}}"#
        );
        serde_json::from_str(&json).unwrap()
    }

    #[tokio::test]
    async fn corrupt_entries_are_refused_on_read() {
        let store = Arc::new(MemoryStore::new());
        store.save(&corrupt_record("g1", "m1")).await.unwrap();
        let state = BoardState::new(store);
        let (scope, item) = (ScopeId::from("g1"), ItemId::from("m1"));

        let err = state.entry(&scope, &item).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        let err = state.entry_or_create_scope(&scope, &item).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));

        // other items of the scope stay readable
        assert!(state
            .entry(&scope, &ItemId::from("m2"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn empty_entry_is_refused() {
        let state = BoardState::new(Arc::new(MemoryStore::new()));
        let mut e = entry("m1", "u1");
        e.remove_voter(&UserId::from("u1"));

        let err = state
            .upsert_entry(&ScopeId::from("g1"), &ItemId::from("m1"), e)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(state.scope(&ScopeId::from("g1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_items_in_one_scope_are_all_kept() {
        let state = Arc::new(BoardState::new(Arc::new(MemoryStore::new())));
        let scope = ScopeId::from("g1");

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let state = Arc::clone(&state);
                let scope = scope.clone();
                tokio::spawn(async move {
                    let item = format!("m{}", i);
                    state
                        .upsert_entry(&scope, &ItemId::new(item.clone()), entry(&item, "u1"))
                        .await
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let record = state.scope(&scope).await.unwrap().unwrap();
        assert_eq!(record.len(), 20);
    }
}
