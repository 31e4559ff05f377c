//! Starboard Core
//!
//! Pure domain layer of the starboard: the data model, the admission rules
//! for endorsement notifications, display tiers, and representative-image
//! extraction. Nothing here performs I/O; persistence, rendering and
//! orchestration live in `starboard-engine`.
//!
//! # Modules
//!
//! - **models**: notifications, board entries, per-scope records
//! - **eligibility**: [`admit`] decides whether a notification may proceed
//! - **extract**: [`extract_image`] picks the image shown on a board post
//! - **tier**: [`classify`] maps a count to an icon band and label
//! - **recency**: [`RecencyWindow`], a time-windowed dedup set

pub mod eligibility;
pub mod extract;
pub mod models;
pub mod recency;
pub mod tier;

pub use eligibility::{admit, AdmissionContext, Rejection};
pub use extract::{extract_image, IMAGE_EXTENSIONS};
pub use models::{
    Attachment, BoardEntry, ChannelId, ContentItem, EndorsementAction, ItemId, Notification,
    PostId, ScopeBoardSettings, ScopeId, UserId,
};
pub use recency::RecencyWindow;
pub use tier::{classify, tier_for, Tier, TierLabel, TIERS};

/// Reaction token that counts as an endorsement unless configured otherwise.
pub const DEFAULT_ENDORSEMENT_REACTION: &str = "⭐";
