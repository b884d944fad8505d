use chrono::{DateTime, Utc};
use serde::Serialize;

/// Referrer/referee relationship (PostgreSQL).
///
/// A referee can only ever be referred once; the referee address is the
/// natural key. `reward_amount` accumulates apportioned RewardAdded shares
/// until the referrer claims.
#[derive(Debug, Clone, Serialize)]
pub struct Referral {
    pub referee: String,
    pub referrer: String,
    pub tx_hash: String,
    pub recorded_at: DateTime<Utc>,
    pub reward_amount: i64,
    pub claimed_at: Option<DateTime<Utc>>,
}
