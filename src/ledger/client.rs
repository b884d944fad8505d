use std::future::IntoFuture;
use std::str::FromStr;
use std::time::Duration;

use alloy::{
    eips::BlockNumberOrTag,
    primitives::{Address, Bytes, LogData, B256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::Filter,
};
use async_trait::async_trait;
use log::info;
use moka::future::Cache;
use thiserror::Error;
use url::Url;

use crate::config::LedgerSettings;
use crate::utils::hex_encode;

/// Errors at the ledger boundary.
///
/// Rate limits, oversized responses, malformed payloads and timeouts all
/// surface as retryable failures; the backfill engine reacts by narrowing
/// the requested window instead of guessing a size up front.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("provider error: {0}")]
    Provider(String),
    #[error("ledger call timed out after {0:?}")]
    Timeout(Duration),
    #[error("block {0} not found")]
    MissingBlock(u64),
    #[error("invalid contract address: {0}")]
    InvalidAddress(String),
}

impl LedgerError {
    /// True when narrowing the window and retrying can plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider(_) | Self::Timeout(_))
    }
}

/// A raw log entry as returned by the ledger, before decoding.
#[derive(Debug, Clone)]
pub struct RawLog {
    /// Emitting contract, lowercase.
    pub address: String,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: u64,
    pub tx_hash: String,
    pub log_index: u32,
}

impl RawLog {
    pub fn topic0(&self) -> Option<&B256> {
        self.topics.first()
    }

    /// Repackage topics + data for alloy's typed event decoding.
    pub fn log_data(&self) -> LogData {
        LogData::new_unchecked(self.topics.clone(), self.data.clone())
    }
}

/// Read-only chain access consumed by the backfill engine.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn current_height(&self) -> Result<u64, LedgerError>;

    /// Fetch logs for one contract over an inclusive block range.
    /// `topics` filters on topic0; `None` fetches every log the contract
    /// emitted in the range (signature-ambiguity fallback).
    async fn get_logs(
        &self,
        address: &str,
        topics: Option<&[B256]>,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawLog>, LedgerError>;

    async fn block_timestamp(&self, number: u64) -> Result<u64, LedgerError>;
}

/// JSON-RPC ledger client backed by an alloy HTTP provider.
///
/// Every call is raced against a fixed deadline; a timeout is treated as a
/// retryable provider failure. Block timestamps are immutable, so they are
/// cached with a bounded capacity and TTL.
pub struct RpcLedgerClient {
    provider: DynProvider,
    request_timeout: Duration,
    timestamps: Cache<u64, u64>,
}

impl RpcLedgerClient {
    pub fn new(settings: &LedgerSettings) -> anyhow::Result<Self> {
        let url = Url::parse(&settings.rpc_url)?;
        let client = ProviderBuilder::new().connect_http(url);
        let provider = DynProvider::new(client);

        info!("Ledger client connected to {}", settings.rpc_url);

        let timestamps = Cache::builder()
            .max_capacity(settings.timestamp_cache_capacity)
            .time_to_live(Duration::from_secs(settings.timestamp_cache_ttl_secs))
            .build();

        Ok(Self {
            provider,
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
            timestamps,
        })
    }

    async fn with_deadline<T, F>(&self, fut: F) -> Result<T, LedgerError>
    where
        F: std::future::Future<Output = Result<T, alloy::transports::TransportError>>,
    {
        match tokio::time::timeout(self.request_timeout, fut).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => Err(LedgerError::Provider(e.to_string())),
            Err(_) => Err(LedgerError::Timeout(self.request_timeout)),
        }
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn current_height(&self) -> Result<u64, LedgerError> {
        self.with_deadline(self.provider.get_block_number()).await
    }

    async fn get_logs(
        &self,
        address: &str,
        topics: Option<&[B256]>,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawLog>, LedgerError> {
        let address = Address::from_str(address)
            .map_err(|_| LedgerError::InvalidAddress(address.to_string()))?;

        let mut filter = Filter::new()
            .address(address)
            .from_block(from_block)
            .to_block(to_block);

        if let Some(topics) = topics {
            filter = filter.event_signature(topics.to_vec());
        }

        let logs = self.with_deadline(self.provider.get_logs(&filter)).await?;

        let raw = logs
            .into_iter()
            .filter_map(|log| {
                let block_number = log.block_number?;
                let tx_hash = log.transaction_hash.map(|h| hex_encode(h.as_slice()))?;
                Some(RawLog {
                    address: hex_encode(log.address().as_slice()),
                    topics: log.topics().to_vec(),
                    data: log.data().data.clone(),
                    block_number,
                    tx_hash,
                    log_index: log.log_index.unwrap_or(0) as u32,
                })
            })
            .collect();

        Ok(raw)
    }

    async fn block_timestamp(&self, number: u64) -> Result<u64, LedgerError> {
        if let Some(ts) = self.timestamps.get(&number).await {
            return Ok(ts);
        }

        let block = self
            .with_deadline(
                self.provider
                    .get_block_by_number(BlockNumberOrTag::Number(number))
                    .into_future(),
            )
            .await?
            .ok_or(LedgerError::MissingBlock(number))?;

        let ts = block.header.timestamp;
        self.timestamps.insert(number, ts).await;
        Ok(ts)
    }
}
