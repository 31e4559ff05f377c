//! Board aggregation records.

use super::ids::{ChannelId, ItemId, PostId, ScopeId, UserId};
use super::notification::ContentItem;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Aggregation state for one endorsed content item.
///
/// The snapshot fields are captured from the source content when the entry
/// is created and never re-derived afterwards. `count` always equals the
/// number of voters, and the author is never a voter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardEntry {
    /// Original author of the content
    pub author_id: UserId,

    /// Channel the content was posted in
    pub source_channel_id: ChannelId,

    /// Board channel the post lives in
    pub board_channel_id: ChannelId,

    /// The rendered board post
    pub post_id: PostId,

    pub snapshot_text: String,

    pub snapshot_image_url: Option<String>,

    /// Unix millis of the source content
    pub snapshot_timestamp: u64,

    count: u32,

    voters: BTreeSet<UserId>,
}

impl BoardEntry {
    /// Create an entry for the first accepted endorsement of `item`.
    pub fn new(
        item: &ContentItem,
        image_url: Option<String>,
        board_channel_id: ChannelId,
        post_id: PostId,
        first_voter: UserId,
    ) -> Self {
        let mut entry = Self {
            author_id: item.author_id.clone(),
            source_channel_id: item.channel_id.clone(),
            board_channel_id,
            post_id,
            snapshot_text: item.text.clone(),
            snapshot_image_url: image_url,
            snapshot_timestamp: item.created_at,
            count: 0,
            voters: BTreeSet::new(),
        };
        entry.add_voter(first_voter);
        entry
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn voters(&self) -> impl Iterator<Item = &UserId> {
        self.voters.iter()
    }

    pub fn has_voter(&self, user: &UserId) -> bool {
        self.voters.contains(user)
    }

    /// Record an endorsement. Returns false (and changes nothing) for the
    /// author or a user who already endorsed.
    pub fn add_voter(&mut self, user: UserId) -> bool {
        if user == self.author_id || !self.voters.insert(user) {
            return false;
        }
        self.count = self.count.saturating_add(1);
        true
    }

    /// Withdraw an endorsement. Returns false if `user` was not a voter.
    pub fn remove_voter(&mut self, user: &UserId) -> bool {
        if !self.voters.remove(user) {
            return false;
        }
        self.count = self.count.saturating_sub(1);
        true
    }

    /// True once the last endorsement is gone and the entry must be dropped.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Check the stored invariants. Records loaded from storage are only as
    /// trustworthy as whoever wrote them, so readers check this before use.
    pub fn is_consistent(&self) -> bool {
        self.count as usize == self.voters.len() && !self.voters.contains(&self.author_id)
    }
}

/// Per-scope board record: item id → entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeBoardSettings {
    pub scope_id: ScopeId,

    #[serde(default)]
    pub entries: BTreeMap<ItemId, BoardEntry>,
}

impl ScopeBoardSettings {
    /// Empty record for a scope seen for the first time.
    pub fn new(scope_id: ScopeId) -> Self {
        Self {
            scope_id,
            entries: BTreeMap::new(),
        }
    }

    pub fn entry(&self, item_id: &ItemId) -> Option<&BoardEntry> {
        self.entries.get(item_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
