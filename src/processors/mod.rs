//! Event processors: one per event kind.
//!
//! Every processor is idempotent under replay. The natural-key insert is
//! checked first; a duplicate is a no-op (or a narrowly-allowed patch such
//! as backfilling a badge referrer), never an error. The backfill engine
//! replays whole windows after a crash, so these run for the same log more
//! than once in normal operation.

mod badge;
mod checkin;
mod profile;
mod referral;
mod rewards;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::db::Database;
use crate::notify::NotificationPublisher;
use crate::points::PointsEngine;
use crate::worker::{DecodedEvent, EventSource, LogMeta, ProcessLog};

pub struct Processors {
    db: Arc<Database>,
    points: PointsEngine,
    notifier: Option<Arc<NotificationPublisher>>,
    base_points: i64,
}

impl Processors {
    pub fn new(
        db: Arc<Database>,
        points: PointsEngine,
        notifier: Option<Arc<NotificationPublisher>>,
        base_points: i64,
    ) -> Self {
        Self {
            db,
            points,
            notifier,
            base_points,
        }
    }

    /// Fire-and-forget notification; a missing publisher means off.
    async fn notify<T: Serialize>(&self, event_type: &str, addresses: &[String], payload: &T) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(event_type, addresses, payload).await;
        }
    }
}

#[async_trait]
impl ProcessLog for Processors {
    async fn process(
        &self,
        _source: &EventSource,
        event: DecodedEvent,
        meta: &LogMeta,
    ) -> anyhow::Result<()> {
        match event {
            DecodedEvent::BadgeMinted {
                owner,
                token_id,
                tier,
                referrer,
            } => self.process_badge_mint(owner, token_id, tier, referrer, meta).await,
            DecodedEvent::CheckIn {
                account,
                checkin_number,
                message,
            } => self.process_checkin(account, checkin_number, message, meta).await,
            DecodedEvent::UsernameSet {
                account,
                username,
            } => self.process_username(account, username).await,
            DecodedEvent::ReferralRecorded {
                referrer,
                referee,
            } => self.process_referral(referrer, referee, meta).await,
            DecodedEvent::RewardAdded {
                referrer,
                amount,
            } => self.process_reward_added(referrer, amount, meta).await,
            DecodedEvent::RewardClaimed {
                referrer,
                amount,
            } => self.process_reward_claimed(referrer, amount, meta).await,
        }
    }
}
