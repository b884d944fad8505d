//! Job that runs one indexing cycle over every configured source.

use anyhow::Result;
use log::info;

use crate::worker::Indexer;

/// Sources run sequentially to respect provider rate limits; per-source
/// failures are logged inside the cycle and never abort the job.
pub async fn run(indexer: &Indexer) -> Result<()> {
    let start = std::time::Instant::now();

    indexer.run_cycle().await;

    info!("Completed indexing cycle in {:?}", start.elapsed());
    Ok(())
}
