mod client;
mod ops;
mod queries;

pub use client::PostgresClient;
pub use queries::{LeaderboardEntry, LeaderboardOrder, PointsBreakdown};
