//! Read-only query surface for the presentation/API layer.
//!
//! These accessors only return projected fields; all writes go through the
//! event processors and the reconciliation engine.

use serde::Serialize;

use crate::db::models::{Badge, Checkin};
use crate::db::postgres::PostgresClient;

/// Leaderboard sort order.
#[derive(Debug, Clone, Copy)]
pub enum LeaderboardOrder {
    Points,
    Checkins,
}

/// One leaderboard row.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub address: String,
    pub username: Option<String>,
    pub points: i64,
    pub checkin_count: i64,
    pub highest_badge_tier: i16,
    pub rank: Option<i64>,
}

/// A user's points breakdown as exposed to the API layer.
#[derive(Debug, Clone, Serialize)]
pub struct PointsBreakdown {
    pub address: String,
    pub points: i64,
    pub checkin_points: i64,
    pub badge_points: i64,
    pub other_points: i64,
    pub rank: Option<i64>,
}

impl PostgresClient {
    pub async fn get_points_breakdown(
        &self,
        address: &str,
    ) -> anyhow::Result<Option<PointsBreakdown>> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT address, points, checkin_points, badge_points, other_points, rank
            FROM indexer.users
            WHERE address = $1
        "#;

        let row = client.query_opt(query, &[&address]).await?;
        Ok(row.map(|r| PointsBreakdown {
            address: r.get("address"),
            points: r.get("points"),
            checkin_points: r.get("checkin_points"),
            badge_points: r.get("badge_points"),
            other_points: r.get("other_points"),
            rank: r.get("rank"),
        }))
    }

    pub async fn get_badge_list(&self, address: &str) -> anyhow::Result<Vec<Badge>> {
        self.get_badges_for_owner(address).await
    }

    pub async fn get_checkin_history(
        &self,
        address: &str,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Checkin>> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT tx_hash, address, checkin_number, block_number, block_timestamp,
                   points, boost, tier_at_checkin, message
            FROM indexer.checkins
            WHERE address = $1
            ORDER BY block_timestamp DESC
            LIMIT $2 OFFSET $3
        "#;

        let rows = client.query(query, &[&address, &limit, &offset]).await?;
        Ok(rows
            .iter()
            .map(|r| Checkin {
                tx_hash: r.get("tx_hash"),
                address: r.get("address"),
                checkin_number: r.get("checkin_number"),
                block_number: r.get("block_number"),
                block_timestamp: r.get("block_timestamp"),
                points: r.get("points"),
                boost: r.get("boost"),
                tier_at_checkin: r.get("tier_at_checkin"),
                message: r.get("message"),
            })
            .collect())
    }

    pub async fn get_leaderboard(
        &self,
        order: LeaderboardOrder,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<LeaderboardEntry>> {
        let client = self.pool.get().await?;
        let query = match order {
            LeaderboardOrder::Points => {
                r#"
                SELECT address, username, points, checkin_count, highest_badge_tier, rank
                FROM indexer.users
                ORDER BY points DESC, checkin_count DESC, last_checkin DESC NULLS LAST
                LIMIT $1 OFFSET $2
                "#
            },
            LeaderboardOrder::Checkins => {
                r#"
                SELECT address, username, points, checkin_count, highest_badge_tier, rank
                FROM indexer.users
                ORDER BY checkin_count DESC, points DESC, last_checkin DESC NULLS LAST
                LIMIT $1 OFFSET $2
                "#
            },
        };

        let rows = client.query(query, &[&limit, &offset]).await?;
        Ok(rows
            .iter()
            .map(|r| LeaderboardEntry {
                address: r.get("address"),
                username: r.get("username"),
                points: r.get("points"),
                checkin_count: r.get("checkin_count"),
                highest_badge_tier: r.get("highest_badge_tier"),
                rank: r.get("rank"),
            })
            .collect())
    }
}
