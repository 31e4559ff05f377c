//! Engine orchestrator.
//!
//! Drives one notification through admission, the create/update/delete
//! branch, the renderer and persistence. Per item the state machine is:
//!
//! ```text
//! NONE   + add(u)    -> create post               -> ACTIVE(1, {u})
//! ACTIVE + add(u)    -> count+1, edit post        -> ACTIVE
//! ACTIVE + remove(u) -> count-1, edit post        -> ACTIVE   (count > 0)
//!                    -> delete post, drop entry   -> NONE     (count = 0)
//! NONE   + remove(u) -> rejected
//! ```
//!
//! Transitions for the same `(scope, item)` pair are serialized by a keyed
//! async lock held for the whole transition; unrelated items run in
//! parallel. State is persisted only after the renderer call returns.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::host::{Blacklist, DestinationResolver, LogNotices, NoBlacklist, Notice, NoticeSink};
use crate::locks::KeyedLocks;
use crate::render::{BoardRenderer, BoardTransport, PostContent, SyncStatus};
use crate::state::BoardState;
use crate::store::ScopeStore;
use serde::Serialize;
use starboard_core::{
    admit, classify, extract_image, AdmissionContext, BoardEntry, ChannelId, EndorsementAction,
    ItemId, Notification, PostId, RecencyWindow, Rejection, ScopeId, UserId,
};
use std::sync::{Arc, Mutex};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Result of handling one notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// First endorsement: entry and board post created
    Created {
        post_id: PostId,
        count: u32,
        label: String,
    },
    /// Count changed on an existing entry
    Updated {
        count: u32,
        label: String,
        sync: SyncStatus,
    },
    /// Last endorsement withdrawn: entry dropped, post deleted
    Removed { sync: SyncStatus },
    /// Notification not admitted; nothing changed
    Rejected {
        reason: Rejection,
        /// Notice text, if one was delivered
        notice: Option<String>,
    },
    /// Board post could not be created; nothing changed
    Abandoned { error: String },
}

type NoticeKey = (UserId, ScopeId, ItemId, Rejection);

/// Unix time in milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// The endorsement aggregation engine.
pub struct Engine {
    config: EngineConfig,
    state: BoardState,
    renderer: BoardRenderer,
    destinations: Arc<dyn DestinationResolver>,
    blacklist: Arc<dyn Blacklist>,
    notices: Arc<dyn NoticeSink>,
    item_locks: KeyedLocks<(ScopeId, ItemId)>,
    recent_notices: Mutex<RecencyWindow<NoticeKey>>,
}

impl Engine {
    /// Create an engine with no blacklist and log-only notices.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn ScopeStore>,
        transport: Arc<dyn BoardTransport>,
        destinations: Arc<dyn DestinationResolver>,
    ) -> Self {
        let recent_notices = Mutex::new(RecencyWindow::new(config.notice_window));
        Self {
            config,
            state: BoardState::new(store),
            renderer: BoardRenderer::new(transport),
            destinations,
            blacklist: Arc::new(NoBlacklist),
            notices: Arc::new(LogNotices),
            item_locks: KeyedLocks::new(),
            recent_notices,
        }
    }

    /// Set the blacklist consulted before every notification.
    pub fn with_blacklist(mut self, blacklist: Arc<dyn Blacklist>) -> Self {
        self.blacklist = blacklist;
        self
    }

    /// Set where rejection notices are delivered.
    pub fn with_notices(mut self, notices: Arc<dyn NoticeSink>) -> Self {
        self.notices = notices;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read access to board state.
    pub fn state(&self) -> &BoardState {
        &self.state
    }

    /// Handle one add/remove notification.
    ///
    /// Admission failures come back as [`Outcome::Rejected`]; `Err` means a
    /// collaborator or the store failed.
    pub async fn handle(&self, notification: &Notification) -> Result<Outcome> {
        // cheap exit for unrelated reactions before any I/O or locking
        if notification.reaction != self.config.reaction {
            return Ok(Outcome::Rejected {
                reason: Rejection::NotEndorsement,
                notice: None,
            });
        }

        let scope_id = &notification.scope_id;
        let item_id = notification.item_id();
        let _guard = self
            .item_locks
            .lock((scope_id.clone(), item_id.clone()))
            .await;

        let blacklisted = self.blacklist.is_blacklisted(&notification.endorser_id).await?;
        let destination = self.destinations.board_destination(scope_id).await?;

        let entry = if blacklisted || destination.is_none() {
            None
        } else {
            match notification.action {
                EndorsementAction::Add => {
                    self.state.entry_or_create_scope(scope_id, item_id).await?
                }
                EndorsementAction::Remove => self.state.entry(scope_id, item_id).await?,
            }
        };

        let ctx = AdmissionContext {
            endorsement_reaction: &self.config.reaction,
            blacklisted,
            has_destination: destination.is_some(),
            entry: entry.as_ref(),
            now: now_millis(),
            min_tenure_ms: self.config.min_member_age.as_millis() as u64,
        };
        if let Err(reason) = admit(notification, &ctx) {
            return Ok(self.reject(notification, reason).await);
        }

        tracing::debug!(
            scope = %scope_id,
            item = %item_id,
            endorser = %notification.endorser_id,
            action = %notification.action,
            "endorsement admitted"
        );

        match (notification.action, entry, destination) {
            (EndorsementAction::Add, None, Some(board_channel)) => {
                self.create(notification, board_channel).await
            }
            (EndorsementAction::Add, Some(entry), _) => self.endorse(notification, entry).await,
            (EndorsementAction::Remove, Some(entry), _) => self.withdraw(notification, entry).await,
            (EndorsementAction::Add, None, None) => {
                Ok(self.reject(notification, Rejection::NoDestination).await)
            }
            (EndorsementAction::Remove, None, _) => {
                Ok(self.reject(notification, Rejection::NotEndorsed).await)
            }
        }
    }

    /// `NONE + add`: snapshot the content, create the post, store the entry.
    async fn create(&self, notification: &Notification, board_channel: ChannelId) -> Result<Outcome> {
        let item = &notification.item;
        let image_url = extract_image(item);
        let tier = classify(1);
        let content = PostContent::from_item(item, image_url.clone(), tier.label.clone());

        let post_id = match self.renderer.create(&board_channel, &content).await {
            Ok(post_id) => post_id,
            Err(e) => {
                tracing::error!(
                    scope = %notification.scope_id,
                    item = %item.id,
                    "failed to create board post, abandoning: {}",
                    e
                );
                return Ok(Outcome::Abandoned {
                    error: e.to_string(),
                });
            }
        };

        let entry = BoardEntry::new(
            item,
            image_url,
            board_channel,
            post_id.clone(),
            notification.endorser_id.clone(),
        );
        let count = entry.count();
        if let Err(e) = self
            .state
            .upsert_entry(&notification.scope_id, &item.id, entry)
            .await
        {
            tracing::error!(
                scope = %notification.scope_id,
                item = %item.id,
                post = %post_id,
                "inconsistency: board post created but entry not persisted: {}",
                e
            );
            return Err(e);
        }

        Ok(Outcome::Created {
            post_id,
            count,
            label: tier.label,
        })
    }

    /// `ACTIVE + add`: one more voter.
    async fn endorse(&self, notification: &Notification, mut entry: BoardEntry) -> Result<Outcome> {
        entry.add_voter(notification.endorser_id.clone());
        self.sync_and_store(notification, entry).await
    }

    /// `ACTIVE + remove`: one voter fewer; the last one takes the post down.
    async fn withdraw(&self, notification: &Notification, mut entry: BoardEntry) -> Result<Outcome> {
        entry.remove_voter(&notification.endorser_id);
        if !entry.is_empty() {
            return self.sync_and_store(notification, entry).await;
        }

        let sync = self.renderer.delete(&entry.post_id).await;
        if let Err(e) = self
            .state
            .remove_entry(&notification.scope_id, notification.item_id())
            .await
        {
            tracing::error!(
                scope = %notification.scope_id,
                item = %notification.item_id(),
                post = %entry.post_id,
                "inconsistency: board post deleted ({:?}) but entry not removed: {}",
                sync,
                e
            );
            return Err(e);
        }
        Ok(Outcome::Removed { sync })
    }

    async fn sync_and_store(&self, notification: &Notification, entry: BoardEntry) -> Result<Outcome> {
        let count = entry.count();
        let tier = classify(count);
        let content = PostContent::from_entry(notification.item_id(), &entry, tier.label.clone());
        let sync = self.renderer.update(&entry.post_id, &content).await;

        if let Err(e) = self
            .state
            .upsert_entry(&notification.scope_id, notification.item_id(), entry)
            .await
        {
            tracing::error!(
                scope = %notification.scope_id,
                item = %notification.item_id(),
                "board shows {} ({:?}) but count not persisted: {}",
                tier.label,
                sync,
                e
            );
            return Err(e);
        }

        Ok(Outcome::Updated {
            count,
            label: tier.label,
            sync,
        })
    }

    async fn reject(&self, notification: &Notification, reason: Rejection) -> Outcome {
        tracing::debug!(
            scope = %notification.scope_id,
            item = %notification.item_id(),
            endorser = %notification.endorser_id,
            action = %notification.action,
            "endorsement rejected: {}",
            reason
        );

        let notice = match reason.notice(notification.action) {
            Some(text) if self.should_notify(notification, reason) => Notice {
                scope_id: notification.scope_id.clone(),
                channel_id: notification.item.channel_id.clone(),
                user_id: notification.endorser_id.clone(),
                text: text.to_string(),
            },
            _ => {
                return Outcome::Rejected {
                    reason,
                    notice: None,
                }
            }
        };

        if let Err(e) = self.notices.notify(&notice).await {
            tracing::warn!(user = %notice.user_id, "failed to deliver notice: {}", e);
            return Outcome::Rejected {
                reason,
                notice: None,
            };
        }

        Outcome::Rejected {
            reason,
            notice: Some(notice.text),
        }
    }

    /// One notice per user, item and reason per window.
    fn should_notify(&self, notification: &Notification, reason: Rejection) -> bool {
        let key = (
            notification.endorser_id.clone(),
            notification.scope_id.clone(),
            notification.item_id().clone(),
            reason,
        );
        let mut recent = self
            .recent_notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        recent.mark(key, Instant::now())
    }

    /// Prune expired notice-throttling keys. Returns how many were dropped.
    pub fn sweep_notices(&self) -> usize {
        self.recent_notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .sweep(Instant::now())
    }
}
