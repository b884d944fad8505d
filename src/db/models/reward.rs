use chrono::{DateTime, Utc};
use serde::Serialize;

/// A reward claim payout (PostgreSQL).
///
/// Natural key: `(tx_hash, log_index)`; a single transaction can carry
/// several claim logs.
#[derive(Debug, Clone, Serialize)]
pub struct Reward {
    pub tx_hash: String,
    pub log_index: i32,
    pub referrer: String,
    pub amount: i64,
    pub claimed_at: DateTime<Utc>,
}

/// A processed RewardAdded event (PostgreSQL).
///
/// Natural key: `(tx_hash, log_index)`. Recorded before the amount is
/// apportioned across unclaimed referrals, so a replayed log is detected
/// and skipped instead of crediting the shares again.
#[derive(Debug, Clone, Serialize)]
pub struct RewardCredit {
    pub tx_hash: String,
    pub log_index: i32,
    pub referrer: String,
    pub amount: i64,
    pub credited_at: DateTime<Utc>,
}
