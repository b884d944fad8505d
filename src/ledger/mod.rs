//! Ledger access layer.
//!
//! The indexer only needs three capabilities from the chain: the current
//! height, topic-filtered logs over a block range, and block timestamps.
//! They are modeled as the [`LedgerClient`] trait so the backfill engine can
//! be exercised against an in-memory ledger in tests.

mod client;

pub use client::{LedgerClient, LedgerError, RawLog, RpcLedgerClient};
