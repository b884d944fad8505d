//! Pure reconciliation of a user's points from their event history.
//!
//! Event processors write provisional points using whatever tier the user
//! had on record at ingest time. When badge mints and check-ins arrive out
//! of chronological order those provisional values can be wrong, so this
//! pass rebuilds everything from the stored badges and check-ins alone.
//! Running it twice over the same history yields the same result.

use chrono::{DateTime, Utc};

use crate::db::models::{Badge, Checkin};
use crate::points::tables::{badge_bonus, boost_for_tier, checkin_points, milestone_total};
use crate::points::timeline::{effective_tier, tier_timeline};

/// A check-in whose stored tier/boost/points disagree with the rebuilt
/// timeline and need correcting in place.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckinCorrection {
    pub tx_hash: String,
    pub tier: i16,
    pub boost: f64,
    pub points: i64,
}

/// The recomputed aggregate for one address.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub corrections: Vec<CheckinCorrection>,
    pub highest_tier: i16,
    pub checkin_count: i64,
    pub checkin_points: i64,
    pub badge_points: i64,
    pub other_points: i64,
    pub total_points: i64,
    pub last_checkin: Option<DateTime<Utc>>,
}

/// Recompute a user's breakdown from their badges and check-ins.
///
/// Referral-sourced ledger entries are deliberately not an input here; they
/// never count toward the total.
pub fn reconcile(badges: &[Badge], checkins: &[Checkin], base_points: i64) -> Reconciled {
    let timeline = tier_timeline(badges);
    let highest_tier = badges.iter().map(|b| b.tier).max().unwrap_or(-1);

    let mut sorted: Vec<&Checkin> = checkins.iter().collect();
    sorted.sort_by_key(|c| (c.block_timestamp, c.checkin_number));

    let mut corrections = Vec::new();
    let mut checkin_total = 0i64;
    let mut last_checkin = None;

    for checkin in &sorted {
        let tier = effective_tier(&timeline, checkin.block_timestamp);
        let boost = boost_for_tier(tier);
        let points = checkin_points(base_points, tier);
        checkin_total += points;
        last_checkin = last_checkin.max(Some(checkin.block_timestamp));

        if checkin.tier_at_checkin != tier || checkin.boost != boost || checkin.points != points {
            corrections.push(CheckinCorrection {
                tx_hash: checkin.tx_hash.clone(),
                tier,
                boost,
                points,
            });
        }
    }

    let checkin_count = sorted.len() as i64;
    let badge_points = badge_bonus(highest_tier);
    let other_points = milestone_total(checkin_count);

    Reconciled {
        corrections,
        highest_tier,
        checkin_count,
        checkin_points: checkin_total,
        badge_points,
        other_points,
        total_points: checkin_total + badge_points + other_points,
        last_checkin,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const DAY: i64 = 86_400;
    const T0: i64 = 1_700_000_000;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn badge(token_id: i64, tier: i16, minted_secs: i64) -> Badge {
        Badge {
            token_id,
            owner: "0xaa".to_string(),
            tier,
            minted_at: at(minted_secs),
            block_number: minted_secs,
            tx_hash: format!("0xbadge{token_id:x}"),
            referrer: None,
        }
    }

    fn checkin(n: i64, secs: i64, tier: i16, points: i64) -> Checkin {
        Checkin {
            tx_hash: format!("0xcheckin{n:x}"),
            address: "0xaa".to_string(),
            checkin_number: n,
            block_number: secs,
            block_timestamp: at(secs),
            points,
            boost: boost_for_tier(tier),
            tier_at_checkin: tier,
            message: None,
        }
    }

    #[test]
    fn tier_zero_then_tier_two_scenario() {
        // Tier-0 badge at T0, ten check-ins over the next ten days, then a
        // tier-2 mint on day eleven. All check-ins carry the 1.1x boost.
        let badges = vec![badge(1, 0, T0), badge(2, 2, T0 + 11 * DAY)];
        let checkins: Vec<Checkin> = (1..=10)
            .map(|n| checkin(n, T0 + n * DAY - DAY / 2, 0, 11))
            .collect();

        let result = reconcile(&badges, &checkins, 10);

        assert_eq!(result.checkin_points, 110);
        assert_eq!(result.badge_points, 50);
        assert_eq!(result.other_points, 100);
        assert_eq!(result.total_points, 260);
        assert_eq!(result.highest_tier, 2);
        assert_eq!(result.checkin_count, 10);
        assert!(result.corrections.is_empty());
    }

    #[test]
    fn out_of_order_ingest_gets_corrected() {
        // The badge mint was processed after the check-ins, so the stored
        // rows carry tier -1 provisional values.
        let badges = vec![badge(1, 2, T0)];
        let checkins = vec![
            checkin(1, T0 - DAY, -1, 10),
            checkin(2, T0 + DAY, -1, 10),
            checkin(3, T0 + 2 * DAY, -1, 10),
        ];

        let result = reconcile(&badges, &checkins, 10);

        // Only the two check-ins after the mint need correcting.
        assert_eq!(
            result.corrections,
            vec![
                CheckinCorrection {
                    tx_hash: "0xcheckin2".to_string(),
                    tier: 2,
                    boost: 1.3,
                    points: 13,
                },
                CheckinCorrection {
                    tx_hash: "0xcheckin3".to_string(),
                    tier: 2,
                    boost: 1.3,
                    points: 13,
                },
            ]
        );
        assert_eq!(result.checkin_points, 10 + 13 + 13);
        assert_eq!(result.other_points, 50);
        assert_eq!(result.total_points, 36 + 50 + 50);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let badges = vec![badge(1, 1, T0)];
        let mut checkins = vec![
            checkin(1, T0 - DAY, -1, 10),
            checkin(2, T0 + DAY, -1, 10),
        ];

        let first = reconcile(&badges, &checkins, 10);
        assert!(!first.corrections.is_empty());

        // Apply the corrections and run again.
        for c in &first.corrections {
            let row = checkins.iter_mut().find(|x| x.tx_hash == c.tx_hash).unwrap();
            row.tier_at_checkin = c.tier;
            row.boost = c.boost;
            row.points = c.points;
        }
        let second = reconcile(&badges, &checkins, 10);

        assert!(second.corrections.is_empty());
        assert_eq!(second.total_points, first.total_points);
        assert_eq!(second.checkin_points, first.checkin_points);
    }

    #[test]
    fn empty_history_is_all_zeros() {
        let result = reconcile(&[], &[], 10);
        assert_eq!(result.total_points, 0);
        assert_eq!(result.highest_tier, -1);
        assert_eq!(result.last_checkin, None);
        assert!(result.corrections.is_empty());
    }

    #[test]
    fn last_checkin_is_latest_timestamp() {
        let checkins = vec![
            checkin(2, T0 + DAY, -1, 10),
            checkin(1, T0, -1, 10),
        ];
        let result = reconcile(&[], &checkins, 10);
        assert_eq!(result.last_checkin, Some(at(T0 + DAY)));
    }
}
