pub mod badge;
pub mod checkin;
pub mod profile;
pub mod referral;
pub mod rewards;

pub use badge::{legacy::BadgeMinted as BadgeMintedLegacy, BadgeMinted};
pub use checkin::CheckIn;
pub use profile::UsernameSet;
pub use referral::ReferralRecorded;
pub use rewards::{RewardAdded, RewardClaimed};
