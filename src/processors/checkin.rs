use log::{debug, info};
use serde_json::json;

use crate::db::models::{Checkin, PointsEntry, PointsSource};
use crate::points::{boost_for_tier, checkin_points, milestone_crossed};
use crate::processors::Processors;
use crate::worker::LogMeta;

impl Processors {
    /// Handle one check-in.
    ///
    /// Points are provisional: they use the tier currently on record, which
    /// can lag the chain when a badge mint is still unprocessed. The
    /// reconciliation pass corrects them afterwards; the aggregate update
    /// here is an atomic increment so concurrent batch-mates cannot clobber
    /// each other.
    pub(super) async fn process_checkin(
        &self,
        account: String,
        checkin_number: i64,
        message: Option<String>,
        meta: &LogMeta,
    ) -> anyhow::Result<()> {
        let tier = self
            .db
            .postgres
            .get_user(&account)
            .await?
            .map(|u| u.highest_badge_tier)
            .unwrap_or(-1);
        let boost = boost_for_tier(tier);
        let points = checkin_points(self.base_points, tier);

        let checkin = Checkin {
            tx_hash: meta.tx_hash.clone(),
            address: account.clone(),
            checkin_number,
            block_number: meta.block_number as i64,
            block_timestamp: meta.timestamp,
            points,
            boost,
            tier_at_checkin: tier,
            message,
        };

        if !self.db.postgres.insert_checkin(&checkin).await? {
            debug!("Check-in {} already indexed", meta.tx_hash);
            // A crash between the check-in insert and the ledger write leaves
            // the audit row missing. The ledger insert is idempotent on
            // (tx_hash, source), so re-attempting it here repairs that hole;
            // reconciliation restores the aggregates.
            self.db
                .postgres
                .insert_points_entry(&PointsEntry {
                    address: account.clone(),
                    points,
                    reason: format!("Check-in #{}", checkin_number),
                    source: PointsSource::Checkin,
                    tx_hash: Some(meta.tx_hash.clone()),
                    tier_at_event: tier,
                    event_time: meta.timestamp,
                })
                .await?;
            return Ok(());
        }

        let new_count = self
            .db
            .postgres
            .apply_checkin_increment(&account, points, meta.timestamp)
            .await?;

        self.db
            .postgres
            .insert_points_entry(&PointsEntry {
                address: account.clone(),
                points,
                reason: format!("Check-in #{}", checkin_number),
                source: PointsSource::Checkin,
                tx_hash: Some(meta.tx_hash.clone()),
                tier_at_event: tier,
                event_time: meta.timestamp,
            })
            .await?;

        if let Some(bonus) = milestone_crossed(new_count) {
            info!("{} reached the {}-check-in milestone", account, new_count);
            self.db.postgres.add_achievement_points(&account, bonus).await?;
            self.db
                .postgres
                .insert_points_entry(&PointsEntry {
                    address: account.clone(),
                    points: bonus,
                    reason: format!("Milestone: {} check-ins", new_count),
                    source: PointsSource::Achievement,
                    tx_hash: None,
                    tier_at_event: tier,
                    event_time: meta.timestamp,
                })
                .await?;
        }

        self.notify(
            "checkin",
            std::slice::from_ref(&account),
            &json!({
                "checkin_number": checkin_number,
                "points": points,
                "tx_hash": meta.tx_hash,
            }),
        )
        .await;

        Ok(())
    }
}
