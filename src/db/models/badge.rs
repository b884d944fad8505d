use chrono::{DateTime, Utc};
use serde::Serialize;

/// A minted tier badge (PostgreSQL).
///
/// Natural key: `token_id`. Immutable once created, except for backfilling
/// a missing `referrer` when a later replay carries one.
#[derive(Debug, Clone, Serialize)]
pub struct Badge {
    pub token_id: i64,
    /// Badge owner address, lowercase.
    pub owner: String,
    /// Tier 0-4. A user's effective tier is the max tier ever minted.
    pub tier: i16,
    pub minted_at: DateTime<Utc>,
    pub block_number: i64,
    pub tx_hash: String,
    pub referrer: Option<String>,
}
