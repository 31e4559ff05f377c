//! Starboard Engine - endorsement aggregation and board sync
//!
//! Turns a stream of add/remove endorsement notifications into a board:
//! one post per sufficiently endorsed content item, labelled with its
//! current count and tier, removed again when the last endorsement goes.
//!
//! # Architecture
//!
//! - **Engine**: per-notification orchestration ([`Engine::handle`])
//! - **State**: per-scope board records over a [`ScopeStore`]
//! - **Render**: board post create/edit/delete over a [`BoardTransport`]
//! - **Host**: destination, blacklist and notice collaborators
//! - **Storage**: RocksDB backend implementing all of the above for the node
//! - **API / Admin Socket**: HTTP ingress and local admin IPC (starboard-admin CLI)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use starboard_engine::{Engine, EngineConfig, MemoryBoard, MemoryDirectory, MemoryStore};
//! use starboard_core::{ContentItem, Notification};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let directory = Arc::new(MemoryDirectory::new());
//!     directory.set_destination("guild", "starboard").await;
//!
//!     let engine = Engine::new(
//!         EngineConfig::default(),
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(MemoryBoard::new()),
//!         directory,
//!     );
//!
//!     let item = ContentItem::new("msg-1", "general", "alice", "hello", 0);
//!     let outcome = engine.handle(&Notification::add("guild", "⭐", "bob", item)).await?;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

pub mod admin_socket;
pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod locks;
pub mod node;
pub mod render;
pub mod state;
pub mod storage;
pub mod store;

pub use config::{EngineConfig, NodeConfig};
pub use engine::{Engine, Outcome};
pub use error::{Error, Result};
pub use host::{
    Blacklist, DestinationResolver, LogNotices, MemoryDirectory, MemoryNotices, NoBlacklist,
    Notice, NoticeSink,
};
pub use node::{NodeState, StarboardNode};
pub use render::{BoardPost, BoardRenderer, BoardTransport, MemoryBoard, PostContent, SyncStatus};
pub use state::BoardState;
pub use storage::Storage;
pub use store::{MemoryStore, ScopeStore};
