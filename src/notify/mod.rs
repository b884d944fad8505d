//! Outbound notification module.
//!
//! Publishes domain events (badge mints, check-ins, reward claims) for
//! downstream consumers. Strictly fire-and-forget: a dead broker must
//! never slow down or fail ingestion.

mod publisher;

pub use publisher::NotificationPublisher;
