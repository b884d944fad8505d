//! Global rank assignment.

use std::cmp::Reverse;

use crate::db::models::UserRankRow;

/// Assign dense 1-based ranks by `(points desc, checkin_count desc,
/// last_checkin desc)` and return only the `(address, rank)` pairs that
/// differ from what is stored. Users with no check-ins sort after those
/// with one at equal points.
pub fn rank_updates(mut rows: Vec<UserRankRow>) -> Vec<(String, i64)> {
    rows.sort_by_key(|r| (Reverse(r.points), Reverse(r.checkin_count), Reverse(r.last_checkin)));

    rows.into_iter()
        .enumerate()
        .filter_map(|(idx, row)| {
            let rank = (idx + 1) as i64;
            (row.rank != Some(rank)).then_some((row.address, rank))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn row(
        address: &str,
        points: i64,
        checkin_count: i64,
        last_checkin_secs: Option<i64>,
        rank: Option<i64>,
    ) -> UserRankRow {
        UserRankRow {
            address: address.to_string(),
            points,
            checkin_count,
            last_checkin: last_checkin_secs.map(|s| Utc.timestamp_opt(s, 0).unwrap()),
            rank,
        }
    }

    #[test]
    fn higher_points_rank_first() {
        let updates = rank_updates(vec![
            row("0xb", 100, 5, Some(1), None),
            row("0xa", 300, 1, Some(1), None),
            row("0xc", 200, 9, Some(1), None),
        ]);
        assert_eq!(
            updates,
            vec![
                ("0xa".to_string(), 1),
                ("0xc".to_string(), 2),
                ("0xb".to_string(), 3),
            ]
        );
    }

    #[test]
    fn ties_break_by_checkins_then_recency() {
        let updates = rank_updates(vec![
            row("0xa", 100, 3, Some(100), None),
            row("0xb", 100, 5, Some(100), None),
            row("0xc", 100, 5, Some(200), None),
            row("0xd", 100, 5, None, None),
        ]);
        assert_eq!(
            updates,
            vec![
                ("0xc".to_string(), 1),
                ("0xb".to_string(), 2),
                ("0xd".to_string(), 3),
                ("0xa".to_string(), 4),
            ]
        );
    }

    #[test]
    fn unchanged_ranks_are_not_rewritten() {
        let updates = rank_updates(vec![
            row("0xa", 300, 1, None, Some(1)),
            row("0xb", 200, 1, None, Some(3)),
            row("0xc", 100, 1, None, Some(2)),
        ]);
        // 0xa already holds rank 1; only the swapped pair moves.
        assert_eq!(
            updates,
            vec![("0xb".to_string(), 2), ("0xc".to_string(), 3)]
        );
    }
}
