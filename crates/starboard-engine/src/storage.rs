//! Persistent storage using RocksDB.
//!
//! One database holds everything a node persists:
//!
//! - `scope:{id}`: [`ScopeBoardSettings`] records
//! - `destination:{scope}`: configured board channel per scope
//! - `blacklist:{user}`: global endorser blacklist
//! - `post:{id}`: the node's local board posts
//!
//! Values are JSON. The storage doubles as the node's [`ScopeStore`],
//! [`DestinationResolver`], [`Blacklist`] and [`BoardTransport`].

use crate::error::{Error, Result};
use crate::host::{Blacklist, DestinationResolver};
use crate::render::{BoardPost, BoardTransport, PostContent};
use crate::store::ScopeStore;
use async_trait::async_trait;
use rocksdb::{Options, DB};
use serde::de::DeserializeOwned;
use serde::Serialize;
use starboard_core::{ChannelId, PostId, ScopeBoardSettings, ScopeId, UserId};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Storage backend for starboard data.
pub struct Storage {
    db: DB,
    /// Serializes check-and-insert sequences (`create_if_absent`).
    create_lock: Mutex<()>,
    post_seq: AtomicU64,
}

impl Storage {
    /// Open or create storage at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(Self {
            db,
            create_lock: Mutex::new(()),
            post_seq: AtomicU64::new(0),
        })
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.db.get(key.as_bytes())? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_vec(value)?;
        self.db.put(key.as_bytes(), value)?;
        Ok(())
    }

    /// Keys under `prefix`, with the prefix stripped.
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();

        let iter = self.db.prefix_iterator(prefix.as_bytes());
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            let key_str = String::from_utf8_lossy(&key);
            if let Some(rest) = key_str.strip_prefix(prefix) {
                keys.push(rest.to_string());
            }
        }

        Ok(keys)
    }

    // --- Scope records ---

    /// Get a scope record.
    pub fn get_scope(&self, scope_id: &ScopeId) -> Result<Option<ScopeBoardSettings>> {
        self.get_json(&format!("scope:{}", scope_id))
    }

    /// Store a scope record.
    pub fn put_scope(&self, record: &ScopeBoardSettings) -> Result<()> {
        self.put_json(&format!("scope:{}", record.scope_id), record)
    }

    /// Get a scope record, creating an empty one if absent.
    pub fn get_or_create_scope(&self, scope_id: &ScopeId) -> Result<ScopeBoardSettings> {
        let _guard = self
            .create_lock
            .lock()
            .map_err(|_| Error::Storage("scope creation lock poisoned".into()))?;
        if let Some(record) = self.get_scope(scope_id)? {
            return Ok(record);
        }
        let record = ScopeBoardSettings::new(scope_id.clone());
        self.put_scope(&record)?;
        tracing::info!(scope = %scope_id, "created board record");
        Ok(record)
    }

    /// List ids of all scopes with a board record.
    pub fn list_scopes(&self) -> Result<Vec<ScopeId>> {
        Ok(self
            .list_keys("scope:")?
            .into_iter()
            .map(ScopeId::from)
            .collect())
    }

    // --- Board destinations ---

    /// Get the board channel of a scope.
    pub fn get_destination(&self, scope_id: &ScopeId) -> Result<Option<ChannelId>> {
        let key = format!("destination:{}", scope_id);
        Ok(self
            .db
            .get(key.as_bytes())?
            .map(|data| ChannelId::new(String::from_utf8_lossy(&data).into_owned())))
    }

    /// Set or clear the board channel of a scope.
    pub fn set_destination(&self, scope_id: &ScopeId, channel: Option<&ChannelId>) -> Result<()> {
        let key = format!("destination:{}", scope_id);
        match channel {
            Some(channel) => self.db.put(key.as_bytes(), channel.as_str().as_bytes())?,
            None => self.db.delete(key.as_bytes())?,
        }
        Ok(())
    }

    // --- Blacklist ---

    /// Check if a user is blacklisted.
    pub fn is_blacklisted(&self, user_id: &UserId) -> Result<bool> {
        let key = format!("blacklist:{}", user_id);
        Ok(self.db.get(key.as_bytes())?.is_some())
    }

    /// Add or remove a user from the blacklist.
    pub fn set_blacklisted(&self, user_id: &UserId, blacklisted: bool) -> Result<()> {
        let key = format!("blacklist:{}", user_id);
        if blacklisted {
            self.db.put(key.as_bytes(), b"1")?;
        } else {
            self.db.delete(key.as_bytes())?;
        }
        Ok(())
    }

    /// List all blacklisted users.
    pub fn list_blacklist(&self) -> Result<Vec<UserId>> {
        Ok(self
            .list_keys("blacklist:")?
            .into_iter()
            .map(UserId::from)
            .collect())
    }

    // --- Board posts ---

    /// Get a board post.
    pub fn get_post(&self, post_id: &PostId) -> Result<Option<BoardPost>> {
        self.get_json(&format!("post:{}", post_id))
    }

    /// Store a board post.
    pub fn put_post(&self, post: &BoardPost) -> Result<()> {
        self.put_json(&format!("post:{}", post.id), post)
    }

    /// Delete a board post. Returns false if it did not exist.
    pub fn delete_post(&self, post_id: &PostId) -> Result<bool> {
        let key = format!("post:{}", post_id);
        if self.db.get(key.as_bytes())?.is_none() {
            return Ok(false);
        }
        self.db.delete(key.as_bytes())?;
        Ok(true)
    }

    /// Generate a post ID from the target channel, the item and a sequence.
    fn generate_post_id(&self, channel_id: &ChannelId, content: &PostContent) -> PostId {
        let seq = self.post_seq.fetch_add(1, Ordering::SeqCst);
        let seed = format!(
            "{}:{}:{}:{}",
            channel_id,
            content.item_id,
            crate::engine::now_millis(),
            seq
        );
        let hash = blake3::hash(seed.as_bytes());
        PostId::new(hex::encode(&hash.as_bytes()[..16]))
    }
}

#[async_trait]
impl ScopeStore for Storage {
    async fn get(&self, scope_id: &ScopeId) -> Result<Option<ScopeBoardSettings>> {
        self.get_scope(scope_id)
    }

    async fn create_if_absent(&self, scope_id: &ScopeId) -> Result<ScopeBoardSettings> {
        self.get_or_create_scope(scope_id)
    }

    async fn save(&self, record: &ScopeBoardSettings) -> Result<()> {
        self.put_scope(record)
    }
}

#[async_trait]
impl DestinationResolver for Storage {
    async fn board_destination(&self, scope_id: &ScopeId) -> Result<Option<ChannelId>> {
        self.get_destination(scope_id)
    }
}

#[async_trait]
impl Blacklist for Storage {
    async fn is_blacklisted(&self, user_id: &UserId) -> Result<bool> {
        Storage::is_blacklisted(self, user_id)
    }
}

#[async_trait]
impl BoardTransport for Storage {
    async fn create_post(&self, channel_id: &ChannelId, content: &PostContent) -> Result<PostId> {
        let post = BoardPost {
            id: self.generate_post_id(channel_id, content),
            channel_id: channel_id.clone(),
            content: content.clone(),
        };
        self.put_post(&post)?;
        Ok(post.id)
    }

    async fn fetch_post(&self, post_id: &PostId) -> Result<Option<BoardPost>> {
        self.get_post(post_id)
    }

    async fn edit_post(&self, post_id: &PostId, content: &PostContent) -> Result<bool> {
        match self.get_post(post_id)? {
            Some(mut post) => {
                post.content = content.clone();
                self.put_post(&post)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_post(&self, post_id: &PostId) -> Result<bool> {
        Storage::delete_post(self, post_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starboard_core::{BoardEntry, ContentItem, ItemId};
    use tempfile::tempdir;

    #[test]
    fn scope_roundtrip() {
        let dir = tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        let scope = ScopeId::from("g1");

        let mut record = storage.get_or_create_scope(&scope).unwrap();
        assert!(record.is_empty());

        let item = ContentItem::new("m1", "general", "author", "hello", 5);
        let entry = BoardEntry::new(
            &item,
            Some("https://example.com/a.png".into()),
            ChannelId::from("starboard"),
            PostId::from("p1"),
            UserId::from("u1"),
        );
        record.entries.insert(ItemId::from("m1"), entry);
        storage.put_scope(&record).unwrap();

        let loaded = storage.get_scope(&scope).unwrap().unwrap();
        assert_eq!(loaded, record);
        // existing record is returned, not reset
        assert_eq!(storage.get_or_create_scope(&scope).unwrap(), record);
        assert_eq!(storage.list_scopes().unwrap(), vec![scope]);
    }

    #[test]
    fn destinations() {
        let dir = tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        let scope = ScopeId::from("g1");

        assert_eq!(storage.get_destination(&scope).unwrap(), None);
        storage
            .set_destination(&scope, Some(&ChannelId::from("starboard")))
            .unwrap();
        assert_eq!(
            storage.get_destination(&scope).unwrap(),
            Some(ChannelId::from("starboard"))
        );
        storage.set_destination(&scope, None).unwrap();
        assert_eq!(storage.get_destination(&scope).unwrap(), None);
    }

    #[test]
    fn blacklist() {
        let dir = tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();

        storage.set_blacklisted(&UserId::from("a"), true).unwrap();
        storage.set_blacklisted(&UserId::from("b"), true).unwrap();
        assert!(storage.is_blacklisted(&UserId::from("a")).unwrap());
        assert_eq!(storage.list_blacklist().unwrap().len(), 2);

        storage.set_blacklisted(&UserId::from("a"), false).unwrap();
        assert!(!storage.is_blacklisted(&UserId::from("a")).unwrap());
        assert_eq!(storage.list_blacklist().unwrap(), vec![UserId::from("b")]);
    }

    #[tokio::test]
    async fn local_board_posts() {
        let dir = tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        let item = ContentItem::new("m1", "general", "author", "hello", 5);
        let content = PostContent::from_item(&item, None, "1 ⭐".into());

        let id = storage
            .create_post(&ChannelId::from("starboard"), &content)
            .await
            .unwrap();
        let other = storage
            .create_post(&ChannelId::from("starboard"), &content)
            .await
            .unwrap();
        assert_ne!(id, other);

        let mut edited = content.clone();
        edited.label = "2 ⭐".into();
        assert!(storage.edit_post(&id, &edited).await.unwrap());
        assert_eq!(storage.fetch_post(&id).await.unwrap().unwrap().content, edited);

        assert!(BoardTransport::delete_post(&storage, &id).await.unwrap());
        assert!(!BoardTransport::delete_post(&storage, &id).await.unwrap());
        assert!(!storage.edit_post(&id, &edited).await.unwrap());
    }
}
