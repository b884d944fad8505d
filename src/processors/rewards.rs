use log::{debug, info, warn};
use serde_json::json;

use crate::db::models::{Reward, RewardCredit};
use crate::processors::Processors;
use crate::worker::LogMeta;

impl Processors {
    /// Handle a RewardAdded event: the amount is split evenly across the
    /// referrer's outstanding unclaimed referrals. Integer division; the
    /// remainder stays with the contract, matching how payouts settle.
    ///
    /// The credit is recorded keyed by (tx_hash, log_index) before any
    /// apportioning, so a replayed window skips the whole event instead of
    /// adding the shares a second time.
    pub(super) async fn process_reward_added(
        &self,
        referrer: String,
        amount: i64,
        meta: &LogMeta,
    ) -> anyhow::Result<()> {
        let credit = RewardCredit {
            tx_hash: meta.tx_hash.clone(),
            log_index: meta.log_index as i32,
            referrer: referrer.clone(),
            amount,
            credited_at: meta.timestamp,
        };

        if !self.db.postgres.insert_reward_credit(&credit).await? {
            debug!("Reward credit {}#{} already indexed", meta.tx_hash, meta.log_index);
            return Ok(());
        }

        let unclaimed = self.db.postgres.get_unclaimed_referrals(&referrer).await?;
        if unclaimed.is_empty() {
            warn!(
                "RewardAdded of {} for {} with no unclaimed referrals (tx {})",
                amount, referrer, meta.tx_hash
            );
            return Ok(());
        }

        let share = amount / unclaimed.len() as i64;
        let credited = self.db.postgres.add_reward_to_unclaimed(&referrer, share).await?;
        info!(
            "Apportioned reward of {} across {} referrals for {}",
            amount, credited, referrer
        );

        Ok(())
    }

    /// Handle a RewardClaimed event: record the payout keyed by
    /// (tx_hash, log_index) and close out the referrer's open referrals.
    pub(super) async fn process_reward_claimed(
        &self,
        referrer: String,
        amount: i64,
        meta: &LogMeta,
    ) -> anyhow::Result<()> {
        let reward = Reward {
            tx_hash: meta.tx_hash.clone(),
            log_index: meta.log_index as i32,
            referrer: referrer.clone(),
            amount,
            claimed_at: meta.timestamp,
        };

        if !self.db.postgres.insert_reward(&reward).await? {
            debug!("Reward claim {}#{} already indexed", meta.tx_hash, meta.log_index);
            return Ok(());
        }

        let closed = self
            .db
            .postgres
            .mark_referrals_claimed(&referrer, meta.timestamp)
            .await?;
        info!(
            "{} claimed reward of {} ({} referrals settled)",
            referrer, amount, closed
        );

        self.notify(
            "reward_claimed",
            std::slice::from_ref(&referrer),
            &json!({
                "amount": amount,
                "tx_hash": meta.tx_hash,
            }),
        )
        .await;

        Ok(())
    }
}
