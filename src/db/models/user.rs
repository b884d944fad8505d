use chrono::{DateTime, Utc};
use serde::Serialize;

/// Per-address aggregate projection (PostgreSQL).
///
/// Every field except `address` and `username` is derived and must be
/// reproducible by replaying badges, checkins and the points ledger.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub address: String,
    pub username: Option<String>,
    /// -1 means "no badge".
    pub highest_badge_tier: i16,
    pub checkin_count: i64,
    /// Grand total: checkin + badge + other. Referral-sourced ledger rows
    /// are excluded.
    pub points: i64,
    pub checkin_points: i64,
    pub badge_points: i64,
    pub other_points: i64,
    /// Dense 1-based position by points; None until first rank pass.
    pub rank: Option<i64>,
    pub last_checkin: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Slim row used by the global rank pass.
#[derive(Debug, Clone)]
pub struct UserRankRow {
    pub address: String,
    pub points: i64,
    pub checkin_count: i64,
    pub last_checkin: Option<DateTime<Utc>>,
    pub rank: Option<i64>,
}
