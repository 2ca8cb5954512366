// src/events.rs
//! Per-entity status push channel.
//!
//! A concurrent map from entity key to a broadcast sender. Subscribers get
//! every event published for that entity in emission order; a terminal
//! event prunes the registry entry so listeners do not accumulate. Events
//! emitted while nobody is connected are dropped, not replayed — clients
//! re-fetch current status after a reconnect before trusting the stream.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Buffer depth per entity channel. A lagged subscriber skips events; it
/// never blocks the publisher or other subscribers.
const CHANNEL_CAPACITY: usize = 64;

pub const KIND_JOB_POSTING: &str = "job_posting";
pub const KIND_RESUME_VERSION: &str = "resume_version";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub entity_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl StatusEvent {
    pub fn new(kind: &str, entity_id: &str, status: &str, message: Option<String>) -> Self {
        Self {
            event_type: kind.to_string(),
            entity_id: entity_id.to_string(),
            status: status.to_string(),
            message,
            data: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Terminal events auto-close subscriptions and prune the registry
    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "complete" | "failed" | "fetched")
    }
}

#[derive(Debug, Default)]
pub struct StatusHub {
    channels: DashMap<String, broadcast::Sender<StatusEvent>>,
}

fn entity_key(kind: &str, entity_id: &str) -> String {
    format!("{}:{}", kind, entity_id)
}

impl StatusHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to all future events for one entity
    pub fn subscribe(&self, kind: &str, entity_id: &str) -> broadcast::Receiver<StatusEvent> {
        self.channels
            .entry(entity_key(kind, entity_id))
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publish an event for one entity. Returns the number of subscribers
    /// that will receive it; terminal events prune the channel entry.
    pub fn publish(&self, kind: &str, event: StatusEvent) -> usize {
        let key = entity_key(kind, &event.entity_id);
        let terminal = event.is_terminal();

        let delivered = match self.channels.get(&key) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        };

        if terminal {
            self.channels.remove(&key);
            debug!("Pruned status channel {}", key);
        }

        delivered
    }

    /// Number of live entity channels (used by tests and health reporting)
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_arrive_in_emission_order() {
        let hub = StatusHub::new();
        let mut rx = hub.subscribe(KIND_RESUME_VERSION, "v1");

        for status in ["processing", "optimizing", "finalizing", "complete"] {
            hub.publish(
                KIND_RESUME_VERSION,
                StatusEvent::new(KIND_RESUME_VERSION, "v1", status, None),
            );
        }

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event.status);
        }
        assert_eq!(seen, vec!["processing", "optimizing", "finalizing", "complete"]);
    }

    #[tokio::test]
    async fn test_terminal_event_prunes_channel() {
        let hub = StatusHub::new();
        let _rx = hub.subscribe(KIND_RESUME_VERSION, "v1");
        assert_eq!(hub.channel_count(), 1);

        hub.publish(
            KIND_RESUME_VERSION,
            StatusEvent::new(KIND_RESUME_VERSION, "v1", "failed", Some("boom".into())),
        );
        assert_eq!(hub.channel_count(), 0);
    }

    #[tokio::test]
    async fn test_entities_are_isolated() {
        let hub = StatusHub::new();
        let mut rx_a = hub.subscribe(KIND_RESUME_VERSION, "a");
        let mut rx_b = hub.subscribe(KIND_RESUME_VERSION, "b");

        hub.publish(
            KIND_RESUME_VERSION,
            StatusEvent::new(KIND_RESUME_VERSION, "a", "optimizing", None),
        );

        assert_eq!(rx_a.try_recv().unwrap().status, "optimizing");
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_dropped() {
        let hub = StatusHub::new();
        let delivered = hub.publish(
            KIND_JOB_POSTING,
            StatusEvent::new(KIND_JOB_POSTING, "p1", "fetched", None),
        );
        assert_eq!(delivered, 0);
        assert_eq!(hub.channel_count(), 0);
    }
}
