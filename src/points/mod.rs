//! Points reconciliation engine.
//!
//! The pure core lives in [`reconcile`], [`timeline`], [`tables`] and
//! [`rank`]; [`PointsEngine`] wires it to the store.

mod rank;
mod reconcile;
mod tables;
mod timeline;

use std::sync::Arc;

use log::{info, warn};

use crate::db::Database;
use crate::utils::normalize_address;

pub use rank::rank_updates;
pub use reconcile::{reconcile, CheckinCorrection, Reconciled};
pub use tables::{
    badge_bonus, boost_for_tier, checkin_points, milestone_crossed, milestone_total,
    CHECKIN_MILESTONES,
};
pub use timeline::{effective_tier, tier_timeline, TierChange};

/// Recomputes user aggregates from the stored event history and persists
/// the result. The correctness backstop for the provisional writes the
/// event processors make.
#[derive(Clone)]
pub struct PointsEngine {
    db: Arc<Database>,
    base_points: i64,
}

impl PointsEngine {
    pub fn new(db: Arc<Database>, base_points: i64) -> Self {
        Self {
            db,
            base_points,
        }
    }

    /// Rebuild one address: correct stored check-ins and their ledger
    /// entries, then overwrite the user aggregate with the recomputed
    /// breakdown.
    pub async fn recalculate(&self, address: &str) -> anyhow::Result<()> {
        let address = normalize_address(address);
        let badges = self.db.postgres.get_badges_for_owner(&address).await?;
        let checkins = self.db.postgres.get_checkins_for_address(&address).await?;

        let result = reconcile(&badges, &checkins, self.base_points);

        for c in &result.corrections {
            self.db
                .postgres
                .correct_checkin(&c.tx_hash, c.tier, c.boost, c.points)
                .await?;
            self.db
                .postgres
                .correct_ledger_entry(&c.tx_hash, c.points, c.tier)
                .await?;
        }

        // A stored total that disagrees with the recomputed one means some
        // provisional write drifted; it gets corrected below either way.
        if let Some(user) = self.db.postgres.get_user(&address).await? {
            if user.points != result.total_points {
                warn!(
                    "Stored points for {} ({}) disagree with recomputed total ({}), correcting",
                    address, user.points, result.total_points
                );
            }
        }

        self.db
            .postgres
            .set_user_reconciled(
                &address,
                result.highest_tier,
                result.checkin_count,
                result.checkin_points,
                result.badge_points,
                result.other_points,
                result.total_points,
                result.last_checkin,
            )
            .await?;

        if !result.corrections.is_empty() {
            info!(
                "Reconciled {}: {} check-ins corrected, total now {}",
                address,
                result.corrections.len(),
                result.total_points
            );
        }

        Ok(())
    }

    /// Rebuild every known address. Returns the number processed.
    pub async fn recalculate_all(&self) -> anyhow::Result<usize> {
        let addresses = self.db.postgres.get_all_user_addresses().await?;
        info!("Recalculating points for {} users", addresses.len());

        for address in &addresses {
            self.recalculate(address).await?;
        }

        Ok(addresses.len())
    }

    /// Reassign global ranks; only changed ranks are written. Returns the
    /// number of users whose rank moved.
    pub async fn recalculate_all_ranks(&self) -> anyhow::Result<usize> {
        let rows = self.db.postgres.get_rank_rows().await?;
        let updates = rank_updates(rows);

        if !updates.is_empty() {
            self.db.postgres.set_user_ranks(&updates).await?;
            info!("Updated rank for {} users", updates.len());
        }

        Ok(updates.len())
    }
}
