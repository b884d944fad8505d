//! Redpanda (Kafka-compatible) notification publisher.

use std::time::Duration;

use log::{error, info, warn};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use serde::Serialize;
use serde_json::json;

use crate::config::RedpandaSettings;

/// Publishes notifications to `{topic_prefix}.notifications`, keyed by the
/// first affected address so one user's notifications stay ordered.
pub struct NotificationPublisher {
    producer: FutureProducer,
    topic: String,
}

impl NotificationPublisher {
    /// Returns None when Redpanda is disabled or the producer cannot be
    /// created; callers treat a missing publisher as "notifications off".
    pub fn new(settings: &RedpandaSettings) -> Option<Self> {
        if !settings.enabled {
            info!("Notification publishing is disabled");
            return None;
        }

        info!("Connecting to Redpanda brokers: {}", settings.brokers);

        let producer: FutureProducer = match ClientConfig::new()
            .set("bootstrap.servers", &settings.brokers)
            .set("message.timeout.ms", "5000")
            .set("queue.buffering.max.messages", "100000")
            .set("linger.ms", "5")
            .create()
        {
            Ok(p) => p,
            Err(e) => {
                error!("Failed to create Redpanda producer: {}", e);
                return None;
            },
        };

        let topic = format!("{}.notifications", settings.topic_prefix);
        info!("Notification publisher initialized on topic {}", topic);

        Some(Self {
            producer,
            topic,
        })
    }

    /// Publish one notification. Failures are logged and swallowed.
    pub async fn notify<T: Serialize>(&self, event_type: &str, addresses: &[String], payload: &T) {
        let message = json!({
            "event_type": event_type,
            "addresses": addresses,
            "payload": payload,
        });

        let payload = match serde_json::to_string(&message) {
            Ok(p) => p,
            Err(e) => {
                warn!("Failed to serialize {} notification: {}", event_type, e);
                return;
            },
        };

        let key = addresses.first().map(String::as_str).unwrap_or(event_type);
        let record = FutureRecord::to(&self.topic).key(key).payload(&payload);

        if let Err((e, _)) = self.producer.send(record, Duration::from_millis(100)).await {
            warn!("Failed to publish {} notification: {}", event_type, e);
        }
    }

    /// Flush pending messages (call on shutdown).
    pub fn flush(&self) {
        self.producer.flush(Duration::from_secs(5)).ok();
    }
}

impl Drop for NotificationPublisher {
    fn drop(&mut self) {
        self.flush();
    }
}
