//! In-process scope store.

use super::ScopeStore;
use crate::error::Result;
use async_trait::async_trait;
use starboard_core::{ScopeBoardSettings, ScopeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Scope records held in memory. Used by tests and embedders that bring
/// their own durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<ScopeId, ScopeBoardSettings>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Number of scope records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ScopeStore for MemoryStore {
    async fn get(&self, scope_id: &ScopeId) -> Result<Option<ScopeBoardSettings>> {
        Ok(self.records.read().await.get(scope_id).cloned())
    }

    async fn create_if_absent(&self, scope_id: &ScopeId) -> Result<ScopeBoardSettings> {
        let mut records = self.records.write().await;
        let record = records
            .entry(scope_id.clone())
            .or_insert_with(|| ScopeBoardSettings::new(scope_id.clone()));
        Ok(record.clone())
    }

    async fn save(&self, record: &ScopeBoardSettings) -> Result<()> {
        self.records
            .write()
            .await
            .insert(record.scope_id.clone(), record.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
