//! Points lookup tables.
//!
//! These constants define the whole scoring scheme; everything else in the
//! points engine is bookkeeping around them.

/// Check-in milestones: `(count threshold, bonus)`. Cumulative, so a user
/// with 100 check-ins has earned all four.
pub const CHECKIN_MILESTONES: [(i64, i64); 4] = [(1, 50), (7, 50), (50, 50), (100, 200)];

/// Check-in boost multiplier for an effective tier. -1 means "no badge".
pub fn boost_for_tier(tier: i16) -> f64 {
    match tier {
        0 => 1.1,
        1 => 1.2,
        2 => 1.3,
        3 => 1.4,
        t if t >= 4 => 1.5,
        _ => 1.0,
    }
}

/// One-time bonus for the highest tier a user has ever minted.
pub fn badge_bonus(highest_tier: i16) -> i64 {
    match highest_tier {
        0 => 20,
        1 => 30,
        2 => 50,
        3 => 70,
        4 => 100,
        _ => 0,
    }
}

/// Points for one check-in at the given effective tier.
pub fn checkin_points(base_points: i64, tier: i16) -> i64 {
    (base_points as f64 * boost_for_tier(tier)).floor() as i64
}

/// Total milestone bonus for a check-in count.
pub fn milestone_total(checkin_count: i64) -> i64 {
    CHECKIN_MILESTONES
        .iter()
        .filter(|(at, _)| checkin_count >= *at)
        .map(|(_, bonus)| bonus)
        .sum()
}

/// Bonus awarded when a check-in count lands exactly on a milestone.
pub fn milestone_crossed(checkin_count: i64) -> Option<i64> {
    CHECKIN_MILESTONES
        .iter()
        .find(|(at, _)| *at == checkin_count)
        .map(|(_, bonus)| *bonus)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boost_covers_every_tier() {
        assert_eq!(boost_for_tier(-1), 1.0);
        assert_eq!(boost_for_tier(0), 1.1);
        assert_eq!(boost_for_tier(1), 1.2);
        assert_eq!(boost_for_tier(2), 1.3);
        assert_eq!(boost_for_tier(3), 1.4);
        assert_eq!(boost_for_tier(4), 1.5);
        // Tiers above the known range keep the top boost.
        assert_eq!(boost_for_tier(9), 1.5);
    }

    #[test]
    fn badge_bonus_is_zero_outside_known_tiers() {
        assert_eq!(badge_bonus(-1), 0);
        assert_eq!(badge_bonus(2), 50);
        assert_eq!(badge_bonus(4), 100);
        assert_eq!(badge_bonus(5), 0);
    }

    #[test]
    fn checkin_points_floor_not_round() {
        assert_eq!(checkin_points(10, -1), 10);
        assert_eq!(checkin_points(10, 0), 11);
        assert_eq!(checkin_points(10, 4), 15);
        // 15 * 1.1 = 16.5 floors to 16.
        assert_eq!(checkin_points(15, 0), 16);
    }

    #[test]
    fn milestone_total_is_cumulative() {
        assert_eq!(milestone_total(0), 0);
        assert_eq!(milestone_total(1), 50);
        assert_eq!(milestone_total(6), 50);
        assert_eq!(milestone_total(7), 100);
        assert_eq!(milestone_total(50), 150);
        assert_eq!(milestone_total(100), 350);
        assert_eq!(milestone_total(5000), 350);
    }

    #[test]
    fn milestone_crossed_only_on_exact_count() {
        assert_eq!(milestone_crossed(1), Some(50));
        assert_eq!(milestone_crossed(2), None);
        assert_eq!(milestone_crossed(100), Some(200));
        assert_eq!(milestone_crossed(101), None);
    }
}
