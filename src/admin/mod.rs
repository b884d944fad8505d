//! Manual administrative operations.
//!
//! These bypass the schedule and drive the backfill or reconciliation
//! engines directly. Every path leaves the checkpoint sync flag cleared on
//! exit, including on error, so the next scheduled tick can proceed.

use std::sync::Arc;

use anyhow::anyhow;
use log::info;

use crate::db::models::PointsSource;
use crate::db::Database;
use crate::points::PointsEngine;
use crate::worker::Indexer;

pub struct Admin {
    db: Arc<Database>,
    indexer: Arc<Indexer>,
    points: PointsEngine,
}

impl Admin {
    pub fn new(db: Arc<Database>, indexer: Arc<Indexer>, points: PointsEngine) -> Self {
        Self {
            db,
            indexer,
            points,
        }
    }

    /// Hard reset of one source: delete its collections, reset the
    /// checkpoint to the deploy height and replay from scratch, then
    /// rebuild every user aggregate and the ranks.
    pub async fn reindex_all(&self, source: &str) -> anyhow::Result<()> {
        let (source_id, deploy_block) = {
            let src = self
                .indexer
                .sources()
                .iter()
                .find(|s| s.source_id == source || s.source_id.starts_with(&format!("{source}:")))
                .ok_or_else(|| anyhow!("unknown source: {source}"))?;
            (src.source_id.clone(), src.deploy_block)
        };

        info!("Reindexing {} from scratch", source_id);

        let kind = source_id.split(':').next().unwrap_or_default();
        match kind {
            "badge" => {
                self.db.postgres.clear_badges().await?;
                self.db
                    .postgres
                    .clear_points_entries_by_source(PointsSource::Achievement)
                    .await?;
            },
            "checkin" => {
                self.db.postgres.clear_checkins().await?;
                self.db
                    .postgres
                    .clear_points_entries_by_source(PointsSource::Checkin)
                    .await?;
            },
            "rewards" => {
                self.db.postgres.clear_referrals().await?;
                self.db
                    .postgres
                    .clear_points_entries_by_source(PointsSource::Referral)
                    .await?;
            },
            // Username replays are plain upserts; nothing to clear.
            _ => {},
        }

        self.indexer.checkpoints().reset(&source_id, deploy_block).await?;
        self.indexer.run_source(&source_id).await?;

        // The replay rewrote provisional values; rebuild the aggregates.
        self.points.recalculate_all().await?;
        self.points.recalculate_all_ranks().await?;

        info!("Reindex of {} complete", source_id);
        Ok(())
    }

    /// One-off repair for referrers stored with mixed casing before
    /// addresses were normalized at ingest.
    pub async fn fix_referrer_casing(&self) -> anyhow::Result<()> {
        let badges = self.db.postgres.normalize_badge_referrers().await?;
        let referrals = self.db.postgres.normalize_referral_referrers().await?;
        info!(
            "Normalized referrer casing on {} badges and {} referrals",
            badges, referrals
        );
        Ok(())
    }

    /// Re-run reconciliation for one address, or for everyone. Ranks are
    /// refreshed afterwards so they stay consistent with the new totals.
    pub async fn recalculate_points(&self, address: Option<&str>) -> anyhow::Result<()> {
        match address {
            Some(address) => self.points.recalculate(address).await?,
            None => {
                self.points.recalculate_all().await?;
            },
        }

        self.points.recalculate_all_ranks().await?;
        Ok(())
    }

    pub async fn recalculate_all_ranks(&self) -> anyhow::Result<usize> {
        self.points.recalculate_all_ranks().await
    }
}
