mod badge;
mod checkin;
mod checkpoint;
mod points_entry;
mod referral;
mod reward;
mod user;

pub use badge::Badge;
pub use checkin::Checkin;
pub use checkpoint::SyncCheckpoint;
pub use points_entry::{PointsEntry, PointsSource};
pub use referral::Referral;
pub use reward::{Reward, RewardCredit};
pub use user::{User, UserRankRow};
