pub mod abis;
pub mod admin;
pub mod config;
pub mod cron;
pub mod db;
pub mod ledger;
pub mod notify;
pub mod points;
pub mod processors;
pub mod utils;
pub mod worker;

pub use admin::Admin;
pub use config::Settings;
pub use cron::CronScheduler;
pub use db::Database;
pub use ledger::{LedgerClient, RpcLedgerClient};
pub use notify::NotificationPublisher;
pub use points::PointsEngine;
pub use processors::Processors;
pub use worker::Indexer;
