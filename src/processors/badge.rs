use log::{debug, info};
use serde_json::json;

use crate::db::models::{Badge, PointsEntry, PointsSource};
use crate::points::badge_bonus;
use crate::processors::Processors;
use crate::worker::LogMeta;

impl Processors {
    /// Handle a badge mint.
    ///
    /// First-time insert raises the owner's highest tier when the mint
    /// exceeds it, appends the achievement ledger entry for the new tier's
    /// bonus, and runs reconciliation so earlier check-ins pick up the
    /// boost. A replayed mint may only backfill a missing referrer.
    pub(super) async fn process_badge_mint(
        &self,
        owner: String,
        token_id: i64,
        tier: i16,
        referrer: Option<String>,
        meta: &LogMeta,
    ) -> anyhow::Result<()> {
        let badge = Badge {
            token_id,
            owner: owner.clone(),
            tier,
            minted_at: meta.timestamp,
            block_number: meta.block_number as i64,
            tx_hash: meta.tx_hash.clone(),
            referrer: referrer.clone(),
        };

        if !self.db.postgres.insert_badge(&badge).await? {
            debug!("Badge {} already indexed", token_id);
            if let Some(referrer) = &referrer {
                self.db.postgres.set_badge_referrer(token_id, referrer).await?;
            }
            return Ok(());
        }

        info!("Badge {} (tier {}) minted by {}", token_id, tier, owner);

        let current_tier = self
            .db
            .postgres
            .get_user(&owner)
            .await?
            .map(|u| u.highest_badge_tier)
            .unwrap_or(-1);

        if tier > current_tier {
            self.db.postgres.raise_highest_tier(&owner, tier).await?;
            self.db
                .postgres
                .insert_points_entry(&PointsEntry {
                    address: owner.clone(),
                    points: badge_bonus(tier),
                    reason: format!("Badge tier {} bonus", tier),
                    source: PointsSource::Achievement,
                    tx_hash: Some(meta.tx_hash.clone()),
                    tier_at_event: tier,
                    event_time: meta.timestamp,
                })
                .await?;

            // Earlier check-ins may predate this mint in processing order
            // but not in chain order; rebuild the whole breakdown.
            self.points.recalculate(&owner).await?;
        }

        self.notify(
            "badge_minted",
            std::slice::from_ref(&owner),
            &json!({
                "token_id": token_id,
                "tier": tier,
                "tx_hash": meta.tx_hash,
            }),
        )
        .await;

        Ok(())
    }
}
