//! Per-source sync checkpoints.
//!
//! Each event source keeps a cursor at the last fully processed block plus
//! an advisory `is_syncing` flag. The flag stops two schedule ticks in the
//! same process from double-running a source; it is NOT a distributed lock,
//! so running several indexer processes against one store is unsafe and has
//! to be prevented operationally.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use log::info;
use rustc_hash::FxHashMap;

use crate::db::models::SyncCheckpoint;
use crate::db::PostgresClient;

/// Storage for sync checkpoints. Abstracted so the backfill engine can run
/// against an in-memory store in tests and dry runs.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn load(&self, source_id: &str) -> anyhow::Result<Option<SyncCheckpoint>>;
    async fn save(&self, checkpoint: &SyncCheckpoint) -> anyhow::Result<()>;
    /// Take the advisory flag; false when the source is already syncing.
    async fn try_begin(&self, source_id: &str) -> anyhow::Result<bool>;
    /// Clear the advisory flag unconditionally.
    async fn end(&self, source_id: &str) -> anyhow::Result<()>;
    /// Move the cursor forward (monotonic) and refresh the timestamp.
    async fn advance(&self, source_id: &str, through_block: i64) -> anyhow::Result<()>;
    /// Refresh the timestamp only (idle-cycle heartbeat).
    async fn touch(&self, source_id: &str) -> anyhow::Result<()>;
}

#[async_trait]
impl CheckpointStore for PostgresClient {
    async fn load(&self, source_id: &str) -> anyhow::Result<Option<SyncCheckpoint>> {
        self.get_checkpoint(source_id).await
    }

    async fn save(&self, checkpoint: &SyncCheckpoint) -> anyhow::Result<()> {
        self.upsert_checkpoint(checkpoint).await
    }

    async fn try_begin(&self, source_id: &str) -> anyhow::Result<bool> {
        self.try_begin_checkpoint_sync(source_id).await
    }

    async fn end(&self, source_id: &str) -> anyhow::Result<()> {
        self.end_checkpoint_sync(source_id).await
    }

    async fn advance(&self, source_id: &str, through_block: i64) -> anyhow::Result<()> {
        self.advance_checkpoint(source_id, through_block).await
    }

    async fn touch(&self, source_id: &str) -> anyhow::Result<()> {
        self.touch_checkpoint(source_id).await
    }
}

/// In-memory checkpoint store.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    checkpoints: Mutex<FxHashMap<String, SyncCheckpoint>>,
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn load(&self, source_id: &str) -> anyhow::Result<Option<SyncCheckpoint>> {
        Ok(self.checkpoints.lock().unwrap().get(source_id).cloned())
    }

    async fn save(&self, checkpoint: &SyncCheckpoint) -> anyhow::Result<()> {
        self.checkpoints
            .lock()
            .unwrap()
            .insert(checkpoint.source_id.clone(), checkpoint.clone());
        Ok(())
    }

    async fn try_begin(&self, source_id: &str) -> anyhow::Result<bool> {
        let mut map = self.checkpoints.lock().unwrap();
        match map.get_mut(source_id) {
            Some(cp) if cp.is_syncing => Ok(false),
            Some(cp) => {
                cp.is_syncing = true;
                Ok(true)
            },
            None => Ok(false),
        }
    }

    async fn end(&self, source_id: &str) -> anyhow::Result<()> {
        if let Some(cp) = self.checkpoints.lock().unwrap().get_mut(source_id) {
            cp.is_syncing = false;
        }
        Ok(())
    }

    async fn advance(&self, source_id: &str, through_block: i64) -> anyhow::Result<()> {
        if let Some(cp) = self.checkpoints.lock().unwrap().get_mut(source_id) {
            cp.last_processed_block = cp.last_processed_block.max(through_block);
            cp.last_sync_time = Utc::now();
        }
        Ok(())
    }

    async fn touch(&self, source_id: &str) -> anyhow::Result<()> {
        if let Some(cp) = self.checkpoints.lock().unwrap().get_mut(source_id) {
            cp.last_sync_time = Utc::now();
        }
        Ok(())
    }
}

/// Checkpoint reads/writes for the backfill engine.
#[derive(Clone)]
pub struct CheckpointManager {
    store: Arc<dyn CheckpointStore>,
}

impl CheckpointManager {
    pub fn new(store: Arc<dyn CheckpointStore>) -> Self {
        Self {
            store,
        }
    }

    /// Fetch the source's checkpoint, creating one at `deploy_block - 1`
    /// on first run.
    pub async fn get_or_create(
        &self,
        source_id: &str,
        deploy_block: u64,
    ) -> anyhow::Result<SyncCheckpoint> {
        if let Some(cp) = self.store.load(source_id).await? {
            return Ok(cp);
        }

        let cp = SyncCheckpoint::starting_at(source_id.to_string(), deploy_block);
        info!(
            "Created checkpoint for {} at block {}",
            source_id, cp.last_processed_block
        );
        self.store.save(&cp).await?;
        Ok(cp)
    }

    /// Take the advisory sync flag; false means another run of this source
    /// is (or appears to be) in flight and the caller should back off.
    /// A crash can leave the flag stale, so callers treat it as advisory.
    pub async fn begin_sync(&self, source_id: &str) -> anyhow::Result<bool> {
        self.store.try_begin(source_id).await
    }

    pub async fn advance(&self, source_id: &str, through_block: u64) -> anyhow::Result<()> {
        self.store.advance(source_id, through_block as i64).await
    }

    /// Clear the flag. Called on every exit path, success or failure.
    pub async fn end_sync(&self, source_id: &str) -> anyhow::Result<()> {
        self.store.end(source_id).await
    }

    pub async fn touch(&self, source_id: &str) -> anyhow::Result<()> {
        self.store.touch(source_id).await
    }

    /// Reset the cursor to one block before the deploy height and clear
    /// the flag. Used by full reindex.
    pub async fn reset(&self, source_id: &str, deploy_block: u64) -> anyhow::Result<()> {
        let cp = SyncCheckpoint::starting_at(source_id.to_string(), deploy_block);
        self.store.save(&cp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_checkpoint_one_block_before_deploy() {
        let mgr = CheckpointManager::new(Arc::new(MemoryCheckpointStore::default()));
        let cp = mgr.get_or_create("badge:0xabc", 1000).await.unwrap();
        assert_eq!(cp.last_processed_block, 999);
        assert!(!cp.is_syncing);
    }

    #[tokio::test]
    async fn begin_sync_is_exclusive_until_ended() {
        let mgr = CheckpointManager::new(Arc::new(MemoryCheckpointStore::default()));
        mgr.get_or_create("s", 10).await.unwrap();

        assert!(mgr.begin_sync("s").await.unwrap());
        assert!(!mgr.begin_sync("s").await.unwrap());

        mgr.end_sync("s").await.unwrap();
        assert!(mgr.begin_sync("s").await.unwrap());
    }

    #[tokio::test]
    async fn advance_never_moves_backwards() {
        let store = Arc::new(MemoryCheckpointStore::default());
        let mgr = CheckpointManager::new(store.clone());
        mgr.get_or_create("s", 10).await.unwrap();

        mgr.advance("s", 500).await.unwrap();
        mgr.advance("s", 300).await.unwrap();

        let cp = store.load("s").await.unwrap().unwrap();
        assert_eq!(cp.last_processed_block, 500);
    }

    #[tokio::test]
    async fn reset_returns_cursor_to_deploy_height() {
        let store = Arc::new(MemoryCheckpointStore::default());
        let mgr = CheckpointManager::new(store.clone());
        mgr.get_or_create("s", 1000).await.unwrap();
        mgr.advance("s", 5000).await.unwrap();

        mgr.reset("s", 1000).await.unwrap();
        let cp = store.load("s").await.unwrap().unwrap();
        assert_eq!(cp.last_processed_block, 999);
        assert!(!cp.is_syncing);
    }
}
