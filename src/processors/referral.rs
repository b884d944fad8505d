use log::{debug, info};
use serde_json::json;

use crate::db::models::{PointsEntry, PointsSource, Referral};
use crate::processors::Processors;
use crate::worker::LogMeta;

/// Informational points recorded per referral. Referral-sourced ledger
/// entries never count toward a user's total.
const REFERRAL_LEDGER_POINTS: i64 = 50;

impl Processors {
    /// Handle a recorded referral. A referee can only be referred once;
    /// the row is keyed by referee and a replay is a no-op.
    pub(super) async fn process_referral(
        &self,
        referrer: String,
        referee: String,
        meta: &LogMeta,
    ) -> anyhow::Result<()> {
        let referral = Referral {
            referee: referee.clone(),
            referrer: referrer.clone(),
            tx_hash: meta.tx_hash.clone(),
            recorded_at: meta.timestamp,
            reward_amount: 0,
            claimed_at: None,
        };

        if !self.db.postgres.insert_referral(&referral).await? {
            debug!("Referral of {} already indexed", referee);
            return Ok(());
        }

        info!("{} referred {}", referrer, referee);

        self.db
            .postgres
            .insert_points_entry(&PointsEntry {
                address: referrer.clone(),
                points: REFERRAL_LEDGER_POINTS,
                reason: format!("Referred {}", referee),
                source: PointsSource::Referral,
                tx_hash: Some(meta.tx_hash.clone()),
                tier_at_event: -1,
                event_time: meta.timestamp,
            })
            .await?;

        self.notify(
            "referral_recorded",
            &[referrer, referee.clone()],
            &json!({
                "referee": referee,
                "tx_hash": meta.tx_hash,
            }),
        )
        .await;

        Ok(())
    }
}
