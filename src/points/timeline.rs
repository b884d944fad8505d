//! Effective-tier timeline reconstruction.
//!
//! Mints can be observed in any order relative to check-ins, so a user's
//! tier at the moment of a past check-in cannot be read off the current
//! aggregate. Instead it is rebuilt from the mint history: a sequence of
//! `(timestamp, tier)` steps starting at `(epoch, -1)`, appending only when
//! a mint raises the running maximum. The timeline is monotone in both time
//! and tier by construction, even when the mints themselves are not.

use chrono::{DateTime, Utc};

use crate::db::models::Badge;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierChange {
    pub at: DateTime<Utc>,
    pub tier: i16,
}

/// Build the tier timeline from a user's badges.
pub fn tier_timeline(badges: &[Badge]) -> Vec<TierChange> {
    let mut sorted: Vec<&Badge> = badges.iter().collect();
    sorted.sort_by_key(|b| (b.minted_at, b.token_id));

    let mut timeline = vec![TierChange {
        at: DateTime::<Utc>::MIN_UTC,
        tier: -1,
    }];

    for badge in sorted {
        let current = timeline.last().map(|c| c.tier).unwrap_or(-1);
        if badge.tier > current {
            timeline.push(TierChange {
                at: badge.minted_at,
                tier: badge.tier,
            });
        }
    }

    timeline
}

/// The user's effective tier at `at`: the latest timeline step whose
/// timestamp is not after `at`.
pub fn effective_tier(timeline: &[TierChange], at: DateTime<Utc>) -> i16 {
    timeline
        .iter()
        .rev()
        .find(|c| c.at <= at)
        .map(|c| c.tier)
        .unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn badge(token_id: i64, tier: i16, minted_secs: i64) -> Badge {
        Badge {
            token_id,
            owner: "0xaa".to_string(),
            tier,
            minted_at: Utc.timestamp_opt(minted_secs, 0).unwrap(),
            block_number: minted_secs,
            tx_hash: format!("0x{token_id:x}"),
            referrer: None,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn empty_history_is_tier_minus_one() {
        let timeline = tier_timeline(&[]);
        assert_eq!(timeline.len(), 1);
        assert_eq!(effective_tier(&timeline, at(1_000)), -1);
    }

    #[test]
    fn checkin_between_mints_gets_earlier_tier() {
        // Mints at t=100 (tier 1) and t=200 (tier 3).
        let timeline = tier_timeline(&[badge(1, 1, 100), badge(2, 3, 200)]);

        assert_eq!(effective_tier(&timeline, at(50)), -1);
        assert_eq!(effective_tier(&timeline, at(100)), 1);
        assert_eq!(effective_tier(&timeline, at(150)), 1);
        assert_eq!(effective_tier(&timeline, at(200)), 3);
        assert_eq!(effective_tier(&timeline, at(9_999)), 3);
    }

    #[test]
    fn lower_tier_mint_after_higher_is_ignored() {
        let timeline = tier_timeline(&[badge(1, 3, 100), badge(2, 1, 200)]);
        assert_eq!(timeline.len(), 2);
        assert_eq!(effective_tier(&timeline, at(250)), 3);
    }

    #[test]
    fn mint_order_in_input_does_not_matter() {
        let a = tier_timeline(&[badge(1, 1, 100), badge(2, 3, 200)]);
        let b = tier_timeline(&[badge(2, 3, 200), badge(1, 1, 100)]);
        assert_eq!(a, b);
    }
}
