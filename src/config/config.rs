use config::{Config, ConfigError, File};
use serde::Deserialize;

/// PostgreSQL database connection configuration.
///
/// Stores all domain collections: users, badges, checkins, the points
/// ledger, referrals, rewards and sync checkpoints.
#[derive(Debug, Deserialize, Clone)]
pub struct PostgresSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_pool_size() -> usize {
    16
}

/// Ledger (EVM JSON-RPC) client configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct LedgerSettings {
    pub rpc_url: String,
    /// Deadline for a single ledger call. Timeouts count as retryable
    /// provider failures.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Capacity of the block-timestamp cache.
    #[serde(default = "default_timestamp_cache_capacity")]
    pub timestamp_cache_capacity: u64,
    /// TTL of the block-timestamp cache, in seconds.
    #[serde(default = "default_timestamp_cache_ttl_secs")]
    pub timestamp_cache_ttl_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_timestamp_cache_capacity() -> u64 {
    100_000
}

fn default_timestamp_cache_ttl_secs() -> u64 {
    3600
}

/// A single event source: one contract plus the block it was deployed at.
/// Backfill for the source starts one block before `deploy_block`.
#[derive(Debug, Deserialize, Clone)]
pub struct ContractSettings {
    pub address: String,
    pub deploy_block: u64,
}

/// The contracts this indexer follows.
#[derive(Debug, Deserialize, Clone)]
pub struct ContractsSettings {
    pub badge: ContractSettings,
    pub checkin: ContractSettings,
    pub profile: ContractSettings,
    /// Referral + reward events share one contract with distinct topics.
    pub rewards: ContractSettings,
}

/// Backfill engine and scheduler configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct IndexerSettings {
    pub contracts: ContractsSettings,
    /// Blocks fetched per getLogs window.
    #[serde(default = "default_window_size")]
    pub window_size: u64,
    /// Windows at or below this size are not narrowed further on provider
    /// failure; the range is abandoned for the cycle instead.
    #[serde(default = "default_retry_floor")]
    pub retry_floor: u64,
    /// Logs processed concurrently within a window.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Seconds between scheduled indexing cycles.
    #[serde(default = "default_index_interval_secs")]
    pub index_interval_secs: u64,
    /// Seconds between global rank refreshes.
    #[serde(default = "default_rank_refresh_interval_secs")]
    pub rank_refresh_interval_secs: u64,
    /// Base points awarded per check-in before the tier boost.
    #[serde(default = "default_base_checkin_points")]
    pub base_checkin_points: i64,
}

fn default_window_size() -> u64 {
    2000
}

fn default_retry_floor() -> u64 {
    1000
}

fn default_batch_size() -> usize {
    50
}

fn default_index_interval_secs() -> u64 {
    300
}

fn default_rank_refresh_interval_secs() -> u64 {
    900
}

fn default_base_checkin_points() -> i64 {
    10
}

/// Redpanda (Kafka-compatible) notification configuration.
///
/// When enabled, domain events (badge mints, check-ins) are published as
/// fire-and-forget notifications for downstream consumers.
#[derive(Debug, Deserialize, Clone)]
pub struct RedpandaSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Comma-separated list of broker addresses (e.g., "localhost:9092")
    #[serde(default = "default_redpanda_brokers")]
    pub brokers: String,
    /// Topic name prefix (notifications go to {prefix}.notifications)
    #[serde(default = "default_redpanda_topic_prefix")]
    pub topic_prefix: String,
}

fn default_redpanda_brokers() -> String {
    "localhost:9092".to_string()
}

fn default_redpanda_topic_prefix() -> String {
    "sigil".to_string()
}

/// Root application configuration.
///
/// Loaded from `config.yaml` at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub postgres: PostgresSettings,
    pub ledger: LedgerSettings,
    pub indexer: IndexerSettings,
    #[serde(default)]
    pub redpanda: Option<RedpandaSettings>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }
}
