//! Job that reassigns global leaderboard ranks.

use anyhow::Result;
use log::info;

use crate::points::PointsEngine;

pub async fn run(points: &PointsEngine) -> Result<()> {
    let start = std::time::Instant::now();

    let changed = points.recalculate_all_ranks().await?;

    info!(
        "Completed rank refresh in {:?} ({} ranks changed)",
        start.elapsed(),
        changed
    );
    Ok(())
}
