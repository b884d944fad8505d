//! Cron scheduler for the periodic indexing and rank-refresh jobs.

use std::sync::Arc;

use anyhow::Result;
use log::{error, info};
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;

use crate::config::IndexerSettings;
use crate::points::PointsEngine;
use crate::worker::Indexer;

use super::jobs;

/// Runs the background jobs until cancellation.
///
/// There is no mid-job cancellation: a tick that is already running
/// finishes (or fails) on its own; shutdown only stops further ticks.
pub struct CronScheduler {
    indexer: Arc<Indexer>,
    points: PointsEngine,
    index_interval_secs: u64,
    rank_refresh_interval_secs: u64,
}

impl CronScheduler {
    pub fn new(indexer: Arc<Indexer>, points: PointsEngine, settings: &IndexerSettings) -> Self {
        Self {
            indexer,
            points,
            index_interval_secs: settings.index_interval_secs,
            rank_refresh_interval_secs: settings.rank_refresh_interval_secs,
        }
    }

    /// Starts the scheduler and blocks until the token is cancelled.
    pub async fn run(&self, cancellation_token: CancellationToken) -> Result<()> {
        let mut scheduler = JobScheduler::new().await?;

        self.register_index_job(&scheduler).await?;
        self.register_rank_refresh_job(&scheduler).await?;

        scheduler.start().await?;
        info!("Cron scheduler started with 2 jobs");

        cancellation_token.cancelled().await;
        info!("Cron scheduler shutting down...");

        scheduler.shutdown().await?;
        Ok(())
    }

    async fn register_index_job(&self, scheduler: &JobScheduler) -> Result<()> {
        let indexer = self.indexer.clone();
        let interval = self.index_interval_secs;

        let job = Job::new_repeated_async(
            std::time::Duration::from_secs(interval),
            move |_uuid, _lock| {
                let indexer = indexer.clone();
                Box::pin(async move {
                    if let Err(e) = jobs::index_sources::run(&indexer).await {
                        error!("Indexing job failed: {:#}", e);
                    }
                })
            },
        )?;

        scheduler.add(job).await?;
        info!("Registered index_sources job (every {}s)", interval);
        Ok(())
    }

    async fn register_rank_refresh_job(&self, scheduler: &JobScheduler) -> Result<()> {
        let points = self.points.clone();
        let interval = self.rank_refresh_interval_secs;

        let job = Job::new_repeated_async(
            std::time::Duration::from_secs(interval),
            move |_uuid, _lock| {
                let points = points.clone();
                Box::pin(async move {
                    if let Err(e) = jobs::refresh_ranks::run(&points).await {
                        error!("Rank refresh job failed: {:#}", e);
                    }
                })
            },
        )?;

        scheduler.add(job).await?;
        info!("Registered refresh_ranks job (every {}s)", interval);
        Ok(())
    }
}
