//! Persistence interface for per-scope board records.
//!
//! The engine treats persistence as a key-value store keyed by scope id.
//! Backends guarantee atomicity at record granularity and nothing finer;
//! [`BoardState`](crate::state::BoardState) layers entry-level updates on top.

mod memory;

pub use memory::MemoryStore;

use crate::error::Result;
use async_trait::async_trait;
use starboard_core::{ScopeBoardSettings, ScopeId};

/// Record-granular storage for [`ScopeBoardSettings`].
#[async_trait]
pub trait ScopeStore: Send + Sync {
    /// Load a scope record.
    async fn get(&self, scope_id: &ScopeId) -> Result<Option<ScopeBoardSettings>>;

    /// Load a scope record, creating an empty one if absent.
    ///
    /// Concurrent first calls for the same scope must observe a single
    /// record; implementations may not do an unguarded read-then-write.
    async fn create_if_absent(&self, scope_id: &ScopeId) -> Result<ScopeBoardSettings>;

    /// Replace the stored record (last writer wins).
    async fn save(&self, record: &ScopeBoardSettings) -> Result<()>;
}
