//! Chunked log backfill with adaptive window narrowing.
//!
//! Each source is synced from its checkpoint to the current chain head in
//! fixed-size windows. Providers reject or time out oversized responses with
//! no way to know a safe size up front, so a retryable failure on a window
//! above the retry floor splits it into fifth-size sub-windows and recurses.
//! At or below the floor the failure propagates and the cycle retries the
//! range on the next schedule tick.
//!
//! The checkpoint only advances after a whole window is processed, so a crash
//! mid-window replays the window; every write downstream is idempotent on its
//! natural key, which makes the replay harmless.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{join_all, BoxFuture, FutureExt};
use log::{debug, info, warn};

use crate::config::IndexerSettings;
use crate::ledger::{LedgerClient, RawLog};
use crate::utils::ts_from_unix;
use crate::worker::checkpoint::CheckpointManager;
use crate::worker::decoder::{DecodedEvent, LogMeta};
use crate::worker::sources::EventSource;

/// Divisor applied to the window size when a fetch fails retryably.
const NARROWING_FACTOR: u64 = 5;

/// Consumer of decoded events. One implementation routes to the database
/// processors; tests substitute counting fakes.
#[async_trait]
pub trait ProcessLog: Send + Sync {
    async fn process(
        &self,
        source: &EventSource,
        event: DecodedEvent,
        meta: &LogMeta,
    ) -> anyhow::Result<()>;
}

pub struct BackfillEngine {
    ledger: Arc<dyn LedgerClient>,
    checkpoints: CheckpointManager,
    window_size: u64,
    retry_floor: u64,
    batch_size: usize,
}

impl BackfillEngine {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        checkpoints: CheckpointManager,
        settings: &IndexerSettings,
    ) -> Self {
        Self {
            ledger,
            checkpoints,
            window_size: settings.window_size.max(1),
            retry_floor: settings.retry_floor.max(1),
            batch_size: settings.batch_size.max(1),
        }
    }

    pub fn checkpoints(&self) -> &CheckpointManager {
        &self.checkpoints
    }

    /// Sync one source from its checkpoint to the chain head.
    ///
    /// Skips the cycle when the source's advisory sync flag is already taken;
    /// the flag is cleared on every exit path.
    pub async fn run(&self, source: &EventSource, processor: &dyn ProcessLog) -> anyhow::Result<()> {
        let cp = self
            .checkpoints
            .get_or_create(&source.source_id, source.deploy_block)
            .await?;

        if !self.checkpoints.begin_sync(&source.source_id).await? {
            warn!("{} is already syncing, skipping this cycle", source.source_id);
            return Ok(());
        }

        let result = self
            .sync_to_head(source, processor, cp.last_processed_block as u64)
            .await;
        self.checkpoints.end_sync(&source.source_id).await?;
        result
    }

    async fn sync_to_head(
        &self,
        source: &EventSource,
        processor: &dyn ProcessLog,
        last_processed: u64,
    ) -> anyhow::Result<()> {
        let head = self.ledger.current_height().await?;
        if head <= last_processed {
            debug!("{} is at head ({}), nothing to do", source.source_id, head);
            self.checkpoints.touch(&source.source_id).await?;
            return Ok(());
        }

        info!(
            "Syncing {} from block {} to {}",
            source.source_id,
            last_processed + 1,
            head
        );

        let mut from = last_processed + 1;
        while from <= head {
            let to = (from + self.window_size - 1).min(head);
            self.process_window(source, processor, from, to, self.window_size)
                .await?;
            self.checkpoints.advance(&source.source_id, to).await?;
            from = to + 1;
        }

        Ok(())
    }

    /// Fetch and process one window, recursing into narrower sub-windows on
    /// retryable provider failure. Boxed for async recursion.
    fn process_window<'a>(
        &'a self,
        source: &'a EventSource,
        processor: &'a dyn ProcessLog,
        from: u64,
        to: u64,
        window: u64,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        async move {
            let topics = source.topics();
            let mut fetched = self
                .ledger
                .get_logs(&source.address, Some(&topics), from, to)
                .await;

            // Legacy badge mints predate the current event set, so an empty
            // filtered result is refetched without topics. The fallback goes
            // through the same match below so a retryable failure narrows the
            // window instead of failing the cycle.
            if source.unfiltered_fallback && matches!(&fetched, Ok(logs) if logs.is_empty()) {
                fetched = self.ledger.get_logs(&source.address, None, from, to).await;
            }

            let logs = match fetched {
                Ok(logs) => logs,
                Err(e) if e.is_retryable() && window > self.retry_floor => {
                    let narrowed = (window / NARROWING_FACTOR).max(1);
                    warn!(
                        "Fetch of blocks {}-{} for {} failed ({}), retrying in {}-block windows",
                        from, to, source.source_id, e, narrowed
                    );
                    let mut sub_from = from;
                    while sub_from <= to {
                        let sub_to = (sub_from + narrowed - 1).min(to);
                        self.process_window(source, processor, sub_from, sub_to, narrowed)
                            .await?;
                        sub_from = sub_to + 1;
                    }
                    return Ok(());
                },
                Err(e) => return Err(e.into()),
            };

            self.process_logs(source, processor, logs).await
        }
        .boxed()
    }

    async fn process_logs(
        &self,
        source: &EventSource,
        processor: &dyn ProcessLog,
        mut logs: Vec<RawLog>,
    ) -> anyhow::Result<()> {
        if logs.is_empty() {
            return Ok(());
        }

        logs.sort_by_key(|l| (l.block_number, l.log_index));
        info!("Processing {} logs for {}", logs.len(), source.source_id);

        for chunk in logs.chunks(self.batch_size) {
            let results =
                join_all(chunk.iter().map(|raw| self.process_one(source, processor, raw))).await;

            // A bad individual log must not wedge the source; it is logged
            // and the window completes, relying on reconciliation to repair
            // derived totals later.
            for (raw, result) in chunk.iter().zip(results) {
                if let Err(e) = result {
                    warn!(
                        "Failed to process log {}#{} for {}: {:#}",
                        raw.tx_hash, raw.log_index, source.source_id, e
                    );
                }
            }
        }

        Ok(())
    }

    async fn process_one(
        &self,
        source: &EventSource,
        processor: &dyn ProcessLog,
        raw: &RawLog,
    ) -> anyhow::Result<()> {
        let Some(event) = source.decode(raw) else {
            return Ok(());
        };

        let ts = self.ledger.block_timestamp(raw.block_number).await?;
        let meta = LogMeta {
            block_number: raw.block_number,
            tx_hash: raw.tx_hash.clone(),
            log_index: raw.log_index,
            timestamp: ts_from_unix(ts),
        };

        processor.process(source, event, &meta).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use alloy::primitives::{Address, B256, U256};
    use alloy::sol_types::SolEvent;

    use super::*;
    use crate::abis;
    use crate::config::{ContractSettings, ContractsSettings};
    use crate::ledger::LedgerError;
    use crate::utils::hex_encode;
    use crate::worker::checkpoint::{CheckpointStore, MemoryCheckpointStore};

    const ADDR: &str = "0x00000000000000000000000000000000000000aa";

    fn contract() -> ContractSettings {
        ContractSettings {
            address: ADDR.to_string(),
            deploy_block: 1,
        }
    }

    fn settings(window_size: u64, retry_floor: u64) -> IndexerSettings {
        IndexerSettings {
            contracts: ContractsSettings {
                badge: contract(),
                checkin: contract(),
                profile: contract(),
                rewards: contract(),
            },
            window_size,
            retry_floor,
            batch_size: 50,
            index_interval_secs: 300,
            rank_refresh_interval_secs: 900,
            base_checkin_points: 10,
        }
    }

    fn checkin_log(block: u64, n: u64) -> RawLog {
        let data = abis::CheckIn {
            account: Address::repeat_byte(0x44),
            checkinNumber: U256::from(n),
            message: "gm".to_string(),
        }
        .encode_log_data();
        RawLog {
            address: ADDR.to_string(),
            topics: data.topics().to_vec(),
            data: data.data,
            block_number: block,
            tx_hash: hex_encode(&block.to_be_bytes()),
            log_index: 0,
        }
    }

    fn badge_log(block: u64) -> RawLog {
        let data = abis::BadgeMinted {
            owner: Address::repeat_byte(0x11),
            tokenId: U256::from(1),
            tier: 1,
            referrer: Address::ZERO,
        }
        .encode_log_data();
        RawLog {
            address: ADDR.to_string(),
            topics: data.topics().to_vec(),
            data: data.data,
            block_number: block,
            tx_hash: hex_encode(&block.to_be_bytes()),
            log_index: 0,
        }
    }

    /// Ledger fake: fixed head, canned logs, optional max range above which
    /// fetches fail retryably.
    struct MockLedger {
        head: u64,
        logs: Vec<RawLog>,
        max_range: Option<u64>,
        filtered_always_empty: bool,
        fetch_calls: AtomicUsize,
    }

    impl MockLedger {
        fn new(head: u64, logs: Vec<RawLog>) -> Self {
            Self {
                head,
                logs,
                max_range: None,
                filtered_always_empty: false,
                fetch_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LedgerClient for MockLedger {
        async fn current_height(&self) -> Result<u64, LedgerError> {
            Ok(self.head)
        }

        async fn get_logs(
            &self,
            _address: &str,
            topics: Option<&[B256]>,
            from_block: u64,
            to_block: u64,
        ) -> Result<Vec<RawLog>, LedgerError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);

            if topics.is_some() && self.filtered_always_empty {
                return Ok(Vec::new());
            }

            if let Some(max) = self.max_range {
                if to_block - from_block + 1 > max {
                    return Err(LedgerError::Provider("response too large".to_string()));
                }
            }

            Ok(self
                .logs
                .iter()
                .filter(|l| l.block_number >= from_block && l.block_number <= to_block)
                .filter(|l| match topics {
                    Some(topics) => l.topic0().is_some_and(|t| topics.contains(t)),
                    None => true,
                })
                .cloned()
                .collect())
        }

        async fn block_timestamp(&self, number: u64) -> Result<u64, LedgerError> {
            Ok(1_700_000_000 + number)
        }
    }

    /// Records every decoded event it sees; optionally fails on one block.
    #[derive(Default)]
    struct RecordingProcessor {
        seen: Mutex<Vec<(u64, DecodedEvent)>>,
        fail_on_block: Option<u64>,
    }

    #[async_trait]
    impl ProcessLog for RecordingProcessor {
        async fn process(
            &self,
            _source: &EventSource,
            event: DecodedEvent,
            meta: &LogMeta,
        ) -> anyhow::Result<()> {
            if self.fail_on_block == Some(meta.block_number) {
                anyhow::bail!("boom");
            }
            self.seen.lock().unwrap().push((meta.block_number, event));
            Ok(())
        }
    }

    /// Applies each delivered log at most once, keyed on (tx_hash, log_index),
    /// the way the database processors dedupe on natural keys.
    #[derive(Default)]
    struct DedupingProcessor {
        deliveries: AtomicUsize,
        effects: AtomicUsize,
        applied: Mutex<HashSet<(String, u32)>>,
    }

    #[async_trait]
    impl ProcessLog for DedupingProcessor {
        async fn process(
            &self,
            _source: &EventSource,
            _event: DecodedEvent,
            meta: &LogMeta,
        ) -> anyhow::Result<()> {
            self.deliveries.fetch_add(1, Ordering::SeqCst);
            let novel = self
                .applied
                .lock()
                .unwrap()
                .insert((meta.tx_hash.clone(), meta.log_index));
            if novel {
                self.effects.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    fn engine(
        ledger: Arc<dyn LedgerClient>,
        store: Arc<MemoryCheckpointStore>,
        window_size: u64,
        retry_floor: u64,
    ) -> BackfillEngine {
        BackfillEngine::new(
            ledger,
            CheckpointManager::new(store),
            &settings(window_size, retry_floor),
        )
    }

    #[tokio::test]
    async fn syncs_all_windows_and_advances_checkpoint() {
        let logs = vec![checkin_log(10, 1), checkin_log(2500, 2), checkin_log(4999, 3)];
        let ledger = Arc::new(MockLedger::new(5000, logs));
        let store = Arc::new(MemoryCheckpointStore::default());
        let engine = engine(ledger, store.clone(), 2000, 1000);
        let processor = RecordingProcessor::default();
        let source = EventSource::checkin(&contract());

        engine.run(&source, &processor).await.unwrap();

        assert_eq!(processor.seen.lock().unwrap().len(), 3);
        let cp = store.load(&source.source_id).await.unwrap().unwrap();
        assert_eq!(cp.last_processed_block, 5000);
        assert!(!cp.is_syncing);
    }

    #[tokio::test]
    async fn narrows_windows_until_fetches_fit() {
        let logs = vec![checkin_log(100, 1), checkin_log(1900, 2)];
        let mut ledger = MockLedger::new(2000, logs);
        // Full 2000-block window always fails; 400-block sub-windows fit.
        ledger.max_range = Some(450);
        let store = Arc::new(MemoryCheckpointStore::default());
        let engine = engine(Arc::new(ledger), store.clone(), 2000, 100);
        let processor = RecordingProcessor::default();
        let source = EventSource::checkin(&contract());

        engine.run(&source, &processor).await.unwrap();

        assert_eq!(processor.seen.lock().unwrap().len(), 2);
        let cp = store.load(&source.source_id).await.unwrap().unwrap();
        assert_eq!(cp.last_processed_block, 2000);
    }

    #[tokio::test]
    async fn fails_cycle_when_floor_window_still_too_large() {
        let mut ledger = MockLedger::new(2000, vec![checkin_log(100, 1)]);
        ledger.max_range = Some(10);
        let store = Arc::new(MemoryCheckpointStore::default());
        // Floor of 400: the narrowed 400-block windows still exceed the mock
        // provider's limit and may not narrow further.
        let engine = engine(Arc::new(ledger), store.clone(), 2000, 400);
        let processor = RecordingProcessor::default();
        let source = EventSource::checkin(&contract());

        assert!(engine.run(&source, &processor).await.is_err());

        let cp = store.load(&source.source_id).await.unwrap().unwrap();
        assert_eq!(cp.last_processed_block, 0);
        assert!(!cp.is_syncing, "sync flag must clear on failure");
    }

    #[tokio::test]
    async fn skips_cycle_when_source_already_syncing() {
        let ledger = Arc::new(MockLedger::new(1000, vec![checkin_log(5, 1)]));
        let store = Arc::new(MemoryCheckpointStore::default());
        let engine = engine(ledger, store.clone(), 2000, 1000);
        let processor = RecordingProcessor::default();
        let source = EventSource::checkin(&contract());

        engine
            .checkpoints()
            .get_or_create(&source.source_id, source.deploy_block)
            .await
            .unwrap();
        assert!(engine.checkpoints().begin_sync(&source.source_id).await.unwrap());

        engine.run(&source, &processor).await.unwrap();
        assert!(processor.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_log_does_not_stop_the_window() {
        let logs = vec![checkin_log(10, 1), checkin_log(20, 2), checkin_log(30, 3)];
        let ledger = Arc::new(MockLedger::new(100, logs));
        let store = Arc::new(MemoryCheckpointStore::default());
        let engine = engine(ledger, store.clone(), 2000, 1000);
        let processor = RecordingProcessor {
            fail_on_block: Some(20),
            ..Default::default()
        };
        let source = EventSource::checkin(&contract());

        engine.run(&source, &processor).await.unwrap();

        let seen = processor.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        let cp = store.load(&source.source_id).await.unwrap().unwrap();
        assert_eq!(cp.last_processed_block, 100);
    }

    #[tokio::test]
    async fn badge_source_refetches_unfiltered_when_filter_returns_nothing() {
        let mut ledger = MockLedger::new(100, vec![badge_log(50)]);
        ledger.filtered_always_empty = true;
        let store = Arc::new(MemoryCheckpointStore::default());
        let engine = engine(Arc::new(ledger), store, 2000, 1000);
        let processor = RecordingProcessor::default();
        let source = EventSource::badge(&contract());

        engine.run(&source, &processor).await.unwrap();

        let seen = processor.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(matches!(seen[0].1, DecodedEvent::BadgeMinted { .. }));
    }

    #[tokio::test]
    async fn unfiltered_refetch_narrows_instead_of_failing_the_cycle() {
        // The filtered fetch comes back empty, so the unfiltered refetch
        // carries the oversized response. It must narrow like any other
        // fetch rather than abort the cycle.
        let mut ledger = MockLedger::new(2000, vec![badge_log(50)]);
        ledger.filtered_always_empty = true;
        ledger.max_range = Some(450);
        let store = Arc::new(MemoryCheckpointStore::default());
        let engine = engine(Arc::new(ledger), store.clone(), 2000, 100);
        let processor = RecordingProcessor::default();
        let source = EventSource::badge(&contract());

        engine.run(&source, &processor).await.unwrap();

        let seen = processor.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(matches!(seen[0].1, DecodedEvent::BadgeMinted { .. }));
        let cp = store.load(&source.source_id).await.unwrap().unwrap();
        assert_eq!(cp.last_processed_block, 2000);
    }

    #[tokio::test]
    async fn replayed_windows_apply_each_log_once() {
        let logs = vec![checkin_log(10, 1), checkin_log(2500, 2), checkin_log(4999, 3)];
        let ledger = Arc::new(MockLedger::new(5000, logs));
        let store = Arc::new(MemoryCheckpointStore::default());
        let engine = engine(ledger, store.clone(), 2000, 1000);
        let processor = DedupingProcessor::default();
        let source = EventSource::checkin(&contract());

        engine.run(&source, &processor).await.unwrap();
        assert_eq!(processor.effects.load(Ordering::SeqCst), 3);

        // Losing the cursor replays every window; the redelivered logs must
        // not apply a second time.
        engine
            .checkpoints()
            .reset(&source.source_id, source.deploy_block)
            .await
            .unwrap();
        engine.run(&source, &processor).await.unwrap();

        assert_eq!(processor.deliveries.load(Ordering::SeqCst), 6);
        assert_eq!(processor.effects.load(Ordering::SeqCst), 3);
        let cp = store.load(&source.source_id).await.unwrap().unwrap();
        assert_eq!(cp.last_processed_block, 5000);
    }

    #[tokio::test]
    async fn idle_source_touches_checkpoint_without_fetching() {
        let ledger = Arc::new(MockLedger::new(100, Vec::new()));
        let store = Arc::new(MemoryCheckpointStore::default());
        let engine = engine(ledger.clone(), store.clone(), 2000, 1000);
        let processor = RecordingProcessor::default();
        let source = EventSource::checkin(&contract());

        engine.run(&source, &processor).await.unwrap();
        assert_eq!(
            store
                .load(&source.source_id)
                .await
                .unwrap()
                .unwrap()
                .last_processed_block,
            100
        );

        let fetches = ledger.fetch_calls.load(Ordering::SeqCst);
        engine.run(&source, &processor).await.unwrap();
        assert_eq!(ledger.fetch_calls.load(Ordering::SeqCst), fetches);
    }
}
