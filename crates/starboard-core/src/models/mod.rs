//! Starboard data model.
//!
//! # Core Types
//!
//! - [`Notification`] - one add/remove endorsement event with content metadata
//! - [`BoardEntry`] - aggregation state for one endorsed item
//! - [`ScopeBoardSettings`] - per-scope record of all entries

mod board;
mod ids;
mod notification;

pub use board::{BoardEntry, ScopeBoardSettings};
pub use ids::{ChannelId, ItemId, PostId, ScopeId, UserId};
pub use notification::{Attachment, ContentItem, EndorsementAction, Notification};
