use std::sync::Arc;

use crate::config::Settings;

pub mod models;
pub mod postgres;

pub use postgres::PostgresClient;

/// Database handle for the event store.
///
/// All domain collections (users, badges, checkins, points ledger,
/// referrals, rewards, sync checkpoints) live in PostgreSQL.
#[derive(Clone)]
pub struct Database {
    pub postgres: Arc<PostgresClient>,
}

impl Database {
    pub async fn new(settings: Arc<Settings>) -> anyhow::Result<Self> {
        let postgres = PostgresClient::new(settings.postgres.clone()).await?;

        // Apply schema before anything touches the tables
        postgres.migrate().await?;

        Ok(Self {
            postgres: Arc::new(postgres),
        })
    }
}
