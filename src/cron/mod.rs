//! Periodic background scheduling.
//!
//! Two repeating jobs: the indexing cycle (every source, sequentially) and
//! the global rank refresh.

mod jobs;
mod scheduler;

pub use scheduler::CronScheduler;
