use chrono::{DateTime, Utc};
use log::error;

use crate::db::models::{
    Badge, Checkin, PointsEntry, PointsSource, Referral, Reward, RewardCredit, SyncCheckpoint,
    User, UserRankRow,
};
use crate::db::postgres::PostgresClient;

/// Sanitize a string for PostgreSQL by removing null bytes (0x00)
/// which are invalid in UTF-8 text columns. Check-in messages and
/// usernames come straight from calldata and cannot be trusted.
fn sanitize_string(s: &str) -> String {
    s.replace('\0', "")
}

impl PostgresClient {
    // ==================== USERS ====================

    pub async fn get_user(&self, address: &str) -> anyhow::Result<Option<User>> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT
                address, username, highest_badge_tier, checkin_count, points,
                checkin_points, badge_points, other_points, rank, last_checkin, updated_at
            FROM indexer.users
            WHERE address = $1
        "#;

        let row = client.query_opt(query, &[&address]).await?;
        Ok(row.map(|r| row_to_user(&r)))
    }

    /// Set or overwrite a user's username (last write wins).
    pub async fn set_username(&self, address: &str, username: &str) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        let username = sanitize_string(username);
        let query = r#"
            INSERT INTO indexer.users (address, username, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (address) DO UPDATE SET
                username = EXCLUDED.username,
                updated_at = NOW()
        "#;

        client.execute(query, &[&address, &username]).await?;
        Ok(())
    }

    /// Raise the user's highest badge tier. Monotonic: a lower tier mint
    /// never lowers the stored value.
    pub async fn raise_highest_tier(&self, address: &str, tier: i16) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO indexer.users (address, highest_badge_tier, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (address) DO UPDATE SET
                highest_badge_tier = GREATEST(users.highest_badge_tier, EXCLUDED.highest_badge_tier),
                updated_at = NOW()
        "#;

        client.execute(query, &[&address, &tier]).await?;
        Ok(())
    }

    /// Atomically apply one check-in to the user aggregate. Increments
    /// instead of read-modify-write so concurrent batch-mates can't lose
    /// updates. Returns the new check-in count.
    pub async fn apply_checkin_increment(
        &self,
        address: &str,
        points: i64,
        checkin_time: DateTime<Utc>,
    ) -> anyhow::Result<i64> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO indexer.users (address, checkin_count, points, checkin_points, last_checkin, updated_at)
            VALUES ($1, 1, $2, $2, $3, NOW())
            ON CONFLICT (address) DO UPDATE SET
                checkin_count = users.checkin_count + 1,
                points = users.points + EXCLUDED.points,
                checkin_points = users.checkin_points + EXCLUDED.checkin_points,
                last_checkin = GREATEST(users.last_checkin, EXCLUDED.last_checkin),
                updated_at = NOW()
            RETURNING checkin_count
        "#;

        let row = client
            .query_one(query, &[&address, &points, &checkin_time])
            .await?;
        Ok(row.get("checkin_count"))
    }

    /// Add achievement points (milestone bonuses) to the aggregate.
    pub async fn add_achievement_points(&self, address: &str, points: i64) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO indexer.users (address, points, other_points, updated_at)
            VALUES ($1, $2, $2, NOW())
            ON CONFLICT (address) DO UPDATE SET
                points = users.points + EXCLUDED.points,
                other_points = users.other_points + EXCLUDED.other_points,
                updated_at = NOW()
        "#;

        client.execute(query, &[&address, &points]).await?;
        Ok(())
    }

    /// Overwrite the derived points breakdown from a reconciliation pass.
    #[allow(clippy::too_many_arguments)]
    pub async fn set_user_reconciled(
        &self,
        address: &str,
        highest_tier: i16,
        checkin_count: i64,
        checkin_points: i64,
        badge_points: i64,
        other_points: i64,
        total_points: i64,
        last_checkin: Option<DateTime<Utc>>,
    ) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO indexer.users (
                address, highest_badge_tier, checkin_count, points,
                checkin_points, badge_points, other_points, last_checkin, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            ON CONFLICT (address) DO UPDATE SET
                highest_badge_tier = EXCLUDED.highest_badge_tier,
                checkin_count = EXCLUDED.checkin_count,
                points = EXCLUDED.points,
                checkin_points = EXCLUDED.checkin_points,
                badge_points = EXCLUDED.badge_points,
                other_points = EXCLUDED.other_points,
                last_checkin = EXCLUDED.last_checkin,
                updated_at = NOW()
        "#;

        client
            .execute(
                query,
                &[
                    &address,
                    &highest_tier,
                    &checkin_count,
                    &total_points,
                    &checkin_points,
                    &badge_points,
                    &other_points,
                    &last_checkin,
                ],
            )
            .await
            .map_err(|e| {
                error!("Failed to upsert reconciled user {}: {:?}", address, e);
                e
            })?;

        Ok(())
    }

    /// All users in rank order: points desc, then check-in count desc,
    /// then most recent check-in.
    pub async fn get_rank_rows(&self) -> anyhow::Result<Vec<UserRankRow>> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT address, points, checkin_count, last_checkin, rank
            FROM indexer.users
            ORDER BY points DESC, checkin_count DESC, last_checkin DESC NULLS LAST
        "#;

        let rows = client.query(query, &[]).await?;
        Ok(rows
            .iter()
            .map(|r| UserRankRow {
                address: r.get("address"),
                points: r.get("points"),
                checkin_count: r.get("checkin_count"),
                last_checkin: r.get("last_checkin"),
                rank: r.get("rank"),
            })
            .collect())
    }

    /// Batch-apply rank changes via unnest; only changed rows are passed in.
    pub async fn set_user_ranks(&self, updates: &[(String, i64)]) -> anyhow::Result<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let client = self.pool.get().await?;
        let addresses: Vec<&str> = updates.iter().map(|(a, _)| a.as_str()).collect();
        let ranks: Vec<i64> = updates.iter().map(|(_, r)| *r).collect();

        let query = r#"
            UPDATE indexer.users AS u
            SET rank = v.rank, updated_at = NOW()
            FROM (SELECT unnest($1::text[]) AS address, unnest($2::int8[]) AS rank) v
            WHERE u.address = v.address
        "#;

        client.execute(query, &[&addresses, &ranks]).await.map_err(|e| {
            error!("Failed to batch update {} ranks: {:?}", updates.len(), e);
            e
        })?;

        Ok(())
    }

    pub async fn get_all_user_addresses(&self) -> anyhow::Result<Vec<String>> {
        let client = self.pool.get().await?;
        let rows = client
            .query("SELECT address FROM indexer.users ORDER BY address", &[])
            .await?;
        Ok(rows.iter().map(|r| r.get("address")).collect())
    }

    // ==================== BADGES ====================

    pub async fn get_badge(&self, token_id: i64) -> anyhow::Result<Option<Badge>> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT token_id, owner, tier, minted_at, block_number, tx_hash, referrer
            FROM indexer.badges
            WHERE token_id = $1
        "#;

        let row = client.query_opt(query, &[&token_id]).await?;
        Ok(row.map(|r| row_to_badge(&r)))
    }

    /// Insert a badge keyed by token_id. Returns false when the badge
    /// already exists (idempotent replay).
    pub async fn insert_badge(&self, badge: &Badge) -> anyhow::Result<bool> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO indexer.badges (token_id, owner, tier, minted_at, block_number, tx_hash, referrer)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT DO NOTHING
        "#;

        let inserted = client
            .execute(
                query,
                &[
                    &badge.token_id,
                    &badge.owner,
                    &badge.tier,
                    &badge.minted_at,
                    &badge.block_number,
                    &badge.tx_hash,
                    &badge.referrer,
                ],
            )
            .await
            .map_err(|e| {
                error!("Failed to insert badge {}: {:?}", badge.token_id, e);
                e
            })?;

        Ok(inserted == 1)
    }

    /// Backfill a missing referrer. The only mutation badges allow.
    pub async fn set_badge_referrer(&self, token_id: i64, referrer: &str) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        let query = r#"
            UPDATE indexer.badges SET referrer = $2
            WHERE token_id = $1 AND referrer IS NULL
        "#;

        client.execute(query, &[&token_id, &referrer]).await?;
        Ok(())
    }

    pub async fn get_badges_for_owner(&self, owner: &str) -> anyhow::Result<Vec<Badge>> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT token_id, owner, tier, minted_at, block_number, tx_hash, referrer
            FROM indexer.badges
            WHERE owner = $1
            ORDER BY minted_at ASC, token_id ASC
        "#;

        let rows = client.query(query, &[&owner]).await?;
        Ok(rows.iter().map(row_to_badge).collect())
    }

    /// Lowercase stored badge referrers. Returns the number of rows fixed.
    pub async fn normalize_badge_referrers(&self) -> anyhow::Result<u64> {
        let client = self.pool.get().await?;
        let query = r#"
            UPDATE indexer.badges SET referrer = LOWER(referrer)
            WHERE referrer IS NOT NULL AND referrer <> LOWER(referrer)
        "#;

        Ok(client.execute(query, &[]).await?)
    }

    pub async fn clear_badges(&self) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        client.execute("DELETE FROM indexer.badges", &[]).await?;
        Ok(())
    }

    // ==================== CHECKINS ====================

    /// Insert a check-in. Returns false when either natural key (tx_hash or
    /// (address, checkin_number)) already exists.
    pub async fn insert_checkin(&self, checkin: &Checkin) -> anyhow::Result<bool> {
        let client = self.pool.get().await?;
        let message = checkin.message.as_deref().map(sanitize_string);
        let query = r#"
            INSERT INTO indexer.checkins (
                tx_hash, address, checkin_number, block_number, block_timestamp,
                points, boost, tier_at_checkin, message
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT DO NOTHING
        "#;

        let inserted = client
            .execute(
                query,
                &[
                    &checkin.tx_hash,
                    &checkin.address,
                    &checkin.checkin_number,
                    &checkin.block_number,
                    &checkin.block_timestamp,
                    &checkin.points,
                    &checkin.boost,
                    &checkin.tier_at_checkin,
                    &message,
                ],
            )
            .await
            .map_err(|e| {
                error!("Failed to insert checkin {}: {:?}", checkin.tx_hash, e);
                e
            })?;

        Ok(inserted == 1)
    }

    pub async fn get_checkins_for_address(&self, address: &str) -> anyhow::Result<Vec<Checkin>> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT tx_hash, address, checkin_number, block_number, block_timestamp,
                   points, boost, tier_at_checkin, message
            FROM indexer.checkins
            WHERE address = $1
            ORDER BY block_timestamp ASC, checkin_number ASC
        "#;

        let rows = client.query(query, &[&address]).await?;
        Ok(rows.iter().map(row_to_checkin).collect())
    }

    /// Persist a reconciliation correction on one check-in row.
    pub async fn correct_checkin(
        &self,
        tx_hash: &str,
        tier_at_checkin: i16,
        boost: f64,
        points: i64,
    ) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        let query = r#"
            UPDATE indexer.checkins
            SET tier_at_checkin = $2, boost = $3, points = $4
            WHERE tx_hash = $1
        "#;

        client
            .execute(query, &[&tx_hash, &tier_at_checkin, &boost, &points])
            .await?;
        Ok(())
    }

    pub async fn clear_checkins(&self) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        client.execute("DELETE FROM indexer.checkins", &[]).await?;
        Ok(())
    }

    // ==================== POINTS LEDGER ====================

    /// Append a ledger entry. Transaction-bound entries are idempotent on
    /// (tx_hash, source), so a window replay that re-attempts the insert
    /// after a partial write repairs the missing row instead of duplicating
    /// an existing one. Entries without a tx_hash always append.
    pub async fn insert_points_entry(&self, entry: &PointsEntry) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO indexer.points_ledger (address, points, reason, source, tx_hash, tier_at_event, event_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (tx_hash, source) WHERE tx_hash IS NOT NULL DO NOTHING
        "#;

        client
            .execute(
                query,
                &[
                    &entry.address,
                    &entry.points,
                    &entry.reason,
                    &entry.source.as_str(),
                    &entry.tx_hash,
                    &entry.tier_at_event,
                    &entry.event_time,
                ],
            )
            .await
            .map_err(|e| {
                error!("Failed to insert points entry for {}: {:?}", entry.address, e);
                e
            })?;

        Ok(())
    }

    pub async fn get_points_entries(&self, address: &str) -> anyhow::Result<Vec<PointsEntry>> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT address, points, reason, source, tx_hash, tier_at_event, event_time
            FROM indexer.points_ledger
            WHERE address = $1
            ORDER BY event_time ASC, id ASC
        "#;

        let rows = client.query(query, &[&address]).await?;
        Ok(rows.iter().map(row_to_points_entry).collect())
    }

    /// Align a checkin ledger entry with its corrected check-in row.
    pub async fn correct_ledger_entry(
        &self,
        tx_hash: &str,
        points: i64,
        tier_at_event: i16,
    ) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        let query = r#"
            UPDATE indexer.points_ledger
            SET points = $2, tier_at_event = $3
            WHERE tx_hash = $1 AND source = 'checkin'
        "#;

        client.execute(query, &[&tx_hash, &points, &tier_at_event]).await?;
        Ok(())
    }

    pub async fn clear_points_entries_by_source(&self, source: PointsSource) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                "DELETE FROM indexer.points_ledger WHERE source = $1",
                &[&source.as_str()],
            )
            .await?;
        Ok(())
    }

    // ==================== REFERRALS ====================

    /// Insert a referral keyed by referee. Returns false when the referee
    /// was already referred (idempotent replay).
    pub async fn insert_referral(&self, referral: &Referral) -> anyhow::Result<bool> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO indexer.referrals (referee, referrer, tx_hash, recorded_at, reward_amount, claimed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (referee) DO NOTHING
        "#;

        let inserted = client
            .execute(
                query,
                &[
                    &referral.referee,
                    &referral.referrer,
                    &referral.tx_hash,
                    &referral.recorded_at,
                    &referral.reward_amount,
                    &referral.claimed_at,
                ],
            )
            .await?;

        Ok(inserted == 1)
    }

    pub async fn get_unclaimed_referrals(&self, referrer: &str) -> anyhow::Result<Vec<Referral>> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT referee, referrer, tx_hash, recorded_at, reward_amount, claimed_at
            FROM indexer.referrals
            WHERE referrer = $1 AND claimed_at IS NULL
            ORDER BY recorded_at ASC
        "#;

        let rows = client.query(query, &[&referrer]).await?;
        Ok(rows.iter().map(row_to_referral).collect())
    }

    /// Apportion a reward share to every outstanding unclaimed referral of
    /// the referrer. Returns the number of referrals credited.
    pub async fn add_reward_to_unclaimed(&self, referrer: &str, share: i64) -> anyhow::Result<u64> {
        let client = self.pool.get().await?;
        let query = r#"
            UPDATE indexer.referrals
            SET reward_amount = reward_amount + $2
            WHERE referrer = $1 AND claimed_at IS NULL
        "#;

        Ok(client.execute(query, &[&referrer, &share]).await?)
    }

    pub async fn mark_referrals_claimed(
        &self,
        referrer: &str,
        claimed_at: DateTime<Utc>,
    ) -> anyhow::Result<u64> {
        let client = self.pool.get().await?;
        let query = r#"
            UPDATE indexer.referrals
            SET claimed_at = $2
            WHERE referrer = $1 AND claimed_at IS NULL
        "#;

        Ok(client.execute(query, &[&referrer, &claimed_at]).await?)
    }

    /// Lowercase stored referral referrers. Returns the number of rows fixed.
    pub async fn normalize_referral_referrers(&self) -> anyhow::Result<u64> {
        let client = self.pool.get().await?;
        let query = r#"
            UPDATE indexer.referrals SET referrer = LOWER(referrer)
            WHERE referrer <> LOWER(referrer)
        "#;

        Ok(client.execute(query, &[]).await?)
    }

    pub async fn clear_referrals(&self) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        client.execute("DELETE FROM indexer.referrals", &[]).await?;
        client.execute("DELETE FROM indexer.rewards", &[]).await?;
        client.execute("DELETE FROM indexer.reward_credits", &[]).await?;
        Ok(())
    }

    // ==================== REWARDS ====================

    /// Record a processed RewardAdded event keyed by (tx_hash, log_index).
    /// Returns false when the event was already credited (idempotent
    /// replay); the caller must skip apportioning in that case.
    pub async fn insert_reward_credit(&self, credit: &RewardCredit) -> anyhow::Result<bool> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO indexer.reward_credits (tx_hash, log_index, referrer, amount, credited_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (tx_hash, log_index) DO NOTHING
        "#;

        let inserted = client
            .execute(
                query,
                &[
                    &credit.tx_hash,
                    &credit.log_index,
                    &credit.referrer,
                    &credit.amount,
                    &credit.credited_at,
                ],
            )
            .await?;

        Ok(inserted == 1)
    }

    /// Insert a reward claim keyed by (tx_hash, log_index). Returns false
    /// when the claim was already recorded.
    pub async fn insert_reward(&self, reward: &Reward) -> anyhow::Result<bool> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO indexer.rewards (tx_hash, log_index, referrer, amount, claimed_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (tx_hash, log_index) DO NOTHING
        "#;

        let inserted = client
            .execute(
                query,
                &[
                    &reward.tx_hash,
                    &reward.log_index,
                    &reward.referrer,
                    &reward.amount,
                    &reward.claimed_at,
                ],
            )
            .await?;

        Ok(inserted == 1)
    }

    // ==================== SYNC CHECKPOINTS ====================

    pub async fn get_checkpoint(&self, source_id: &str) -> anyhow::Result<Option<SyncCheckpoint>> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT source_id, last_processed_block, is_syncing, last_sync_time
            FROM indexer.sync_checkpoints
            WHERE source_id = $1
        "#;

        let row = client.query_opt(query, &[&source_id]).await?;
        Ok(row.map(|r| SyncCheckpoint {
            source_id: r.get("source_id"),
            last_processed_block: r.get("last_processed_block"),
            is_syncing: r.get("is_syncing"),
            last_sync_time: r.get("last_sync_time"),
        }))
    }

    pub async fn upsert_checkpoint(&self, checkpoint: &SyncCheckpoint) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO indexer.sync_checkpoints (source_id, last_processed_block, is_syncing, last_sync_time)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (source_id) DO UPDATE SET
                last_processed_block = EXCLUDED.last_processed_block,
                is_syncing = EXCLUDED.is_syncing,
                last_sync_time = EXCLUDED.last_sync_time
        "#;

        client
            .execute(
                query,
                &[
                    &checkpoint.source_id,
                    &checkpoint.last_processed_block,
                    &checkpoint.is_syncing,
                    &checkpoint.last_sync_time,
                ],
            )
            .await
            .map_err(|e| {
                error!(
                    "Failed to upsert checkpoint for {}: {:?}",
                    checkpoint.source_id, e
                );
                e
            })?;

        Ok(())
    }

    /// Try to take the advisory sync flag. Returns false when the source is
    /// already marked as syncing.
    pub async fn try_begin_checkpoint_sync(&self, source_id: &str) -> anyhow::Result<bool> {
        let client = self.pool.get().await?;
        let query = r#"
            UPDATE indexer.sync_checkpoints
            SET is_syncing = TRUE
            WHERE source_id = $1 AND is_syncing = FALSE
        "#;

        Ok(client.execute(query, &[&source_id]).await? == 1)
    }

    /// Clear the advisory flag unconditionally (called on every exit path).
    pub async fn end_checkpoint_sync(&self, source_id: &str) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                "UPDATE indexer.sync_checkpoints SET is_syncing = FALSE WHERE source_id = $1",
                &[&source_id],
            )
            .await?;
        Ok(())
    }

    /// Advance the cursor. GREATEST keeps the block monotonic even if a
    /// stale caller reports an older window.
    pub async fn advance_checkpoint(
        &self,
        source_id: &str,
        through_block: i64,
    ) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        let query = r#"
            UPDATE indexer.sync_checkpoints
            SET last_processed_block = GREATEST(last_processed_block, $2),
                last_sync_time = NOW()
            WHERE source_id = $1
        "#;

        client.execute(query, &[&source_id, &through_block]).await?;
        Ok(())
    }

    /// Heartbeat: refresh the timestamp without moving the cursor, so lag
    /// monitors stay quiet through idle cycles.
    pub async fn touch_checkpoint(&self, source_id: &str) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                "UPDATE indexer.sync_checkpoints SET last_sync_time = NOW() WHERE source_id = $1",
                &[&source_id],
            )
            .await?;
        Ok(())
    }
}

// ==================== HELPER FUNCTIONS ====================

fn row_to_user(row: &tokio_postgres::Row) -> User {
    User {
        address: row.get("address"),
        username: row.get("username"),
        highest_badge_tier: row.get("highest_badge_tier"),
        checkin_count: row.get("checkin_count"),
        points: row.get("points"),
        checkin_points: row.get("checkin_points"),
        badge_points: row.get("badge_points"),
        other_points: row.get("other_points"),
        rank: row.get("rank"),
        last_checkin: row.get("last_checkin"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_badge(row: &tokio_postgres::Row) -> Badge {
    Badge {
        token_id: row.get("token_id"),
        owner: row.get("owner"),
        tier: row.get("tier"),
        minted_at: row.get("minted_at"),
        block_number: row.get("block_number"),
        tx_hash: row.get("tx_hash"),
        referrer: row.get("referrer"),
    }
}

fn row_to_checkin(row: &tokio_postgres::Row) -> Checkin {
    Checkin {
        tx_hash: row.get("tx_hash"),
        address: row.get("address"),
        checkin_number: row.get("checkin_number"),
        block_number: row.get("block_number"),
        block_timestamp: row.get("block_timestamp"),
        points: row.get("points"),
        boost: row.get("boost"),
        tier_at_checkin: row.get("tier_at_checkin"),
        message: row.get("message"),
    }
}

fn row_to_points_entry(row: &tokio_postgres::Row) -> PointsEntry {
    let source: String = row.get("source");
    PointsEntry {
        address: row.get("address"),
        points: row.get("points"),
        reason: row.get("reason"),
        source: PointsSource::from_str(&source),
        tx_hash: row.get("tx_hash"),
        tier_at_event: row.get("tier_at_event"),
        event_time: row.get("event_time"),
    }
}

fn row_to_referral(row: &tokio_postgres::Row) -> Referral {
    Referral {
        referee: row.get("referee"),
        referrer: row.get("referrer"),
        tx_hash: row.get("tx_hash"),
        recorded_at: row.get("recorded_at"),
        reward_amount: row.get("reward_amount"),
        claimed_at: row.get("claimed_at"),
    }
}
