use std::sync::Arc;

use anyhow::anyhow;
use log::{error, info};

use crate::config::IndexerSettings;
use crate::db::Database;
use crate::ledger::LedgerClient;
use crate::processors::Processors;
use crate::worker::backfill::BackfillEngine;
use crate::worker::checkpoint::CheckpointManager;
use crate::worker::sources::EventSource;

/// Drives one indexing cycle over every configured source.
///
/// Sources run sequentially so badge tier state lands before the check-ins
/// that depend on it; a failing source is logged and the cycle moves on to
/// the next one.
pub struct Indexer {
    engine: BackfillEngine,
    sources: Vec<EventSource>,
    processors: Arc<Processors>,
}

impl Indexer {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        db: Arc<Database>,
        processors: Arc<Processors>,
        settings: &IndexerSettings,
    ) -> Self {
        let checkpoints = CheckpointManager::new(db.postgres.clone());
        Self {
            engine: BackfillEngine::new(ledger, checkpoints, settings),
            sources: EventSource::all(&settings.contracts),
            processors,
        }
    }

    pub fn sources(&self) -> &[EventSource] {
        &self.sources
    }

    pub fn checkpoints(&self) -> &CheckpointManager {
        self.engine.checkpoints()
    }

    /// Run every source once, in order.
    pub async fn run_cycle(&self) {
        info!("Starting indexing cycle over {} sources", self.sources.len());

        for source in &self.sources {
            if let Err(e) = self.engine.run(source, self.processors.as_ref()).await {
                error!("Indexing cycle for {} failed: {:#}", source.source_id, e);
            }
        }
    }

    /// Run a single source by id. Used by the reindex admin path.
    pub async fn run_source(&self, source_id: &str) -> anyhow::Result<()> {
        let source = self
            .sources
            .iter()
            .find(|s| s.source_id == source_id || s.source_id.starts_with(&format!("{source_id}:")))
            .ok_or_else(|| anyhow!("unknown source: {source_id}"))?;

        self.engine.run(source, self.processors.as_ref()).await
    }
}
