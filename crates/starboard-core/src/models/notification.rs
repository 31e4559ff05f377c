//! Endorsement notifications as delivered by the host.

use super::ids::{ChannelId, ItemId, ScopeId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an endorsement was placed or withdrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndorsementAction {
    Add,
    Remove,
}

impl fmt::Display for EndorsementAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

/// A file attached to a content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Download URL
    pub url: String,

    /// Original filename, if the host reports one
    #[serde(default)]
    pub filename: Option<String>,
}

impl Attachment {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            filename: None,
        }
    }
}

/// The endorsed content as it looks at the moment the notification fires.
///
/// Only the first accepted endorsement snapshots these fields; later
/// notifications may carry edited text that is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ItemId,

    /// Channel the content was posted in
    pub channel_id: ChannelId,

    /// Original author
    pub author_id: UserId,

    /// Text body (may be empty)
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub attachments: Vec<Attachment>,

    /// Unix timestamp in milliseconds
    pub created_at: u64,
}

impl ContentItem {
    /// Create a text-only content item.
    pub fn new(
        id: impl Into<ItemId>,
        channel_id: impl Into<ChannelId>,
        author_id: impl Into<UserId>,
        text: impl Into<String>,
        created_at: u64,
    ) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            author_id: author_id.into(),
            text: text.into(),
            attachments: Vec::new(),
            created_at,
        }
    }

    /// Builder: add an attachment.
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Builder: replace the text body.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

/// One add/remove endorsement event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub action: EndorsementAction,

    pub scope_id: ScopeId,

    /// Reaction token the endorser used (only the configured token counts)
    pub reaction: String,

    pub endorser_id: UserId,

    /// When the endorser joined the scope, unix millis. Unknown if absent.
    #[serde(default)]
    pub endorser_joined_at: Option<u64>,

    pub item: ContentItem,
}

impl Notification {
    /// Build an add notification.
    pub fn add(
        scope_id: impl Into<ScopeId>,
        reaction: impl Into<String>,
        endorser_id: impl Into<UserId>,
        item: ContentItem,
    ) -> Self {
        Self {
            action: EndorsementAction::Add,
            scope_id: scope_id.into(),
            reaction: reaction.into(),
            endorser_id: endorser_id.into(),
            endorser_joined_at: None,
            item,
        }
    }

    /// Build a remove notification.
    pub fn remove(
        scope_id: impl Into<ScopeId>,
        reaction: impl Into<String>,
        endorser_id: impl Into<UserId>,
        item: ContentItem,
    ) -> Self {
        Self {
            action: EndorsementAction::Remove,
            ..Self::add(scope_id, reaction, endorser_id, item)
        }
    }

    /// Builder: record when the endorser joined the scope.
    pub fn with_joined_at(mut self, joined_at: u64) -> Self {
        self.endorser_joined_at = Some(joined_at);
        self
    }

    pub fn item_id(&self) -> &ItemId {
        &self.item.id
    }
}
