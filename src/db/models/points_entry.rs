use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where a points ledger entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PointsSource {
    Checkin,
    Achievement,
    Referral,
    Other,
}

impl PointsSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checkin => "checkin",
            Self::Achievement => "achievement",
            Self::Referral => "referral",
            Self::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "checkin" => Self::Checkin,
            "achievement" => Self::Achievement,
            "referral" => Self::Referral,
            _ => Self::Other,
        }
    }
}

/// Append-only audit record for every points movement (PostgreSQL).
///
/// `points` is stored positive; the `source` tag says what it counts
/// toward. Referral-sourced entries are informational only and excluded
/// from `users.points`.
#[derive(Debug, Clone, Serialize)]
pub struct PointsEntry {
    pub address: String,
    pub points: i64,
    pub reason: String,
    pub source: PointsSource,
    /// Set for checkin entries so reconciliation can correct them in place.
    pub tx_hash: Option<String>,
    pub tier_at_event: i16,
    pub event_time: DateTime<Utc>,
}
