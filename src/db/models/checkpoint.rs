use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Backfill progress checkpoint for one event source (PostgreSQL).
///
/// Tracks the last fully processed block so a restart resumes where the
/// previous run left off. `is_syncing` is an advisory in-process guard
/// against overlapping runs of the same source; it does not protect two
/// separate indexer processes sharing a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncCheckpoint {
    pub source_id: String,
    pub last_processed_block: i64,
    pub is_syncing: bool,
    pub last_sync_time: DateTime<Utc>,
}

impl SyncCheckpoint {
    /// Fresh checkpoint starting one block before the contract deploy
    /// height, so the first window begins at the deploy block itself.
    pub fn starting_at(source_id: String, deploy_block: u64) -> Self {
        Self {
            source_id,
            last_processed_block: deploy_block.saturating_sub(1) as i64,
            is_syncing: false,
            last_sync_time: Utc::now(),
        }
    }
}
