//! Admission rules for endorsement notifications.
//!
//! [`admit`] is a pure predicate: everything it needs (blacklist membership,
//! board destination, current entry, clock) is resolved by the caller and
//! handed in through [`AdmissionContext`].

use crate::models::{BoardEntry, EndorsementAction, Notification};
use serde::Serialize;
use thiserror::Error;

/// Why a notification was not admitted, in rule priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// Reaction is not the endorsement token
    #[error("reaction is not an endorsement")]
    NotEndorsement,

    /// Endorser is on the global blacklist
    #[error("endorser is blacklisted")]
    Blacklisted,

    /// Scope has no board destination configured
    #[error("no board destination configured")]
    NoDestination,

    /// Endorser wrote the content
    #[error("self-endorsement")]
    SelfEndorsement,

    /// Endorser already endorsed this item
    #[error("already endorsed")]
    AlreadyEndorsed,

    /// Endorser has not been in the scope long enough (or the host did not
    /// report when they joined)
    #[error("endorser tenure below minimum")]
    TenureTooShort,

    /// Remove for an item without an entry, or by a non-voter
    #[error("no active endorsement to remove")]
    NotEndorsed,
}

impl Rejection {
    /// User-facing notice for this rejection, if it warrants one.
    pub fn notice(&self, action: EndorsementAction) -> Option<&'static str> {
        match (self, action) {
            (Self::NoDestination, EndorsementAction::Add) => {
                Some("can't star things without a starboard...")
            }
            (Self::NoDestination, EndorsementAction::Remove) => {
                Some("you can't unstar things without a starboard...")
            }
            (Self::SelfEndorsement, _) => Some("you can't star your own messages."),
            (Self::AlreadyEndorsed, _) => Some("you have already starred that message."),
            _ => None,
        }
    }
}

/// Facts about the world at the moment a notification is evaluated.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionContext<'a> {
    /// Reaction token that counts as an endorsement
    pub endorsement_reaction: &'a str,

    pub blacklisted: bool,

    pub has_destination: bool,

    /// Existing board entry for the item, if any
    pub entry: Option<&'a BoardEntry>,

    /// Unix millis
    pub now: u64,

    /// Minimum time in the scope before endorsements count; 0 disables
    pub min_tenure_ms: u64,
}

/// Decide whether a notification may proceed.
pub fn admit(notification: &Notification, ctx: &AdmissionContext<'_>) -> Result<(), Rejection> {
    if notification.reaction != ctx.endorsement_reaction {
        return Err(Rejection::NotEndorsement);
    }
    if ctx.blacklisted {
        return Err(Rejection::Blacklisted);
    }
    if !ctx.has_destination {
        return Err(Rejection::NoDestination);
    }

    let endorser = &notification.endorser_id;
    match notification.action {
        EndorsementAction::Add => {
            let stored_author = ctx.entry.map(|entry| &entry.author_id);
            if *endorser == notification.item.author_id || stored_author == Some(endorser) {
                return Err(Rejection::SelfEndorsement);
            }
            if ctx.entry.is_some_and(|entry| entry.has_voter(endorser)) {
                return Err(Rejection::AlreadyEndorsed);
            }
            if !tenure_satisfied(notification.endorser_joined_at, ctx.now, ctx.min_tenure_ms) {
                return Err(Rejection::TenureTooShort);
            }
            Ok(())
        }
        EndorsementAction::Remove => match ctx.entry {
            Some(entry) if entry.has_voter(endorser) => Ok(()),
            _ => Err(Rejection::NotEndorsed),
        },
    }
}

fn tenure_satisfied(joined_at: Option<u64>, now: u64, min_tenure_ms: u64) -> bool {
    if min_tenure_ms == 0 {
        return true;
    }
    joined_at.is_some_and(|joined| now.saturating_sub(joined) >= min_tenure_ms)
}
