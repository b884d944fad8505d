use chrono::{DateTime, Utc};
use serde::Serialize;

/// One on-chain check-in (PostgreSQL).
///
/// Natural key: `tx_hash`; `(address, checkin_number)` is also unique.
/// `points`, `boost` and `tier_at_checkin` are provisional at ingest time
/// and corrected by reconciliation when badge mints arrive out of order.
#[derive(Debug, Clone, Serialize)]
pub struct Checkin {
    pub tx_hash: String,
    pub address: String,
    /// Sequence number emitted by the contract, not assigned locally.
    pub checkin_number: i64,
    pub block_number: i64,
    pub block_timestamp: DateTime<Utc>,
    pub points: i64,
    pub boost: f64,
    /// The user's effective tier at the moment of the check-in, not their
    /// tier at query time.
    pub tier_at_checkin: i16,
    pub message: Option<String>,
}
