//! In-memory publisher.
//!
//! Keeps the most recent messages in order, up to a fixed capacity. Messages
//! are lost on restart; useful for tests and for running the service without
//! a provider.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{MessagePublisher, OutboundMessage, PublishError};

/// Capacity used by `MemoryPublisher::new`
pub const DEFAULT_MAX_MESSAGES: usize = 10_000;

pub struct MemoryPublisher {
    messages: RwLock<VecDeque<OutboundMessage>>,
    max_messages: usize,
    /// When set, every publish is rejected with this reason
    failure: RwLock<Option<String>>,
}

impl Default for MemoryPublisher {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_MESSAGES)
    }
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `max_messages`, dropping the oldest first
    pub fn with_capacity(max_messages: usize) -> Self {
        Self {
            messages: RwLock::new(VecDeque::new()),
            max_messages: max_messages.max(1),
            failure: RwLock::new(None),
        }
    }

    pub fn capacity(&self) -> usize {
        self.max_messages
    }

    /// All retained messages, oldest first
    pub async fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.read().await.iter().cloned().collect()
    }

    /// Messages published to one queue
    pub async fn messages_for(&self, queue: &str) -> Vec<OutboundMessage> {
        self.messages
            .read()
            .await
            .iter()
            .filter(|message| message.queue == queue)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.messages.write().await.clear();
    }

    /// Reject all following publishes with `reason`, or accept them again with `None`
    pub async fn fail_with(&self, reason: Option<String>) {
        *self.failure.write().await = reason;
    }
}

#[async_trait]
impl MessagePublisher for MemoryPublisher {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn publish(&self, message: &OutboundMessage) -> Result<(), PublishError> {
        if let Some(reason) = self.failure.read().await.clone() {
            return Err(PublishError::Rejected(reason));
        }

        let mut messages = self.messages.write().await;
        if messages.len() >= self.max_messages {
            if let Some(dropped) = messages.pop_front() {
                tracing::debug!(queue = %dropped.queue, "Memory publisher full, dropped oldest message");
            }
        }
        messages.push_back(message.clone());

        tracing::debug!(
            queue = %message.queue,
            event = %message.event,
            recorded = messages.len(),
            "Message recorded"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::notification::Payload;

    fn message(queue: &str) -> OutboundMessage {
        OutboundMessage {
            queue: queue.to_string(),
            event: "build:started",
            payload: Payload {
                build: json!({ "id": 1 }),
                repository: json!({ "id": 2 }),
                log: None,
            },
        }
    }

    #[tokio::test]
    async fn test_records_in_order() {
        let publisher = MemoryPublisher::new();
        publisher.publish(&message("builds")).await.unwrap();
        publisher.publish(&message("jobs")).await.unwrap();

        let queues: Vec<String> = publisher
            .messages()
            .await
            .into_iter()
            .map(|m| m.queue)
            .collect();
        assert_eq!(queues, vec!["builds", "jobs"]);
        assert_eq!(publisher.messages_for("jobs").await.len(), 1);
    }

    #[tokio::test]
    async fn test_drops_oldest_past_capacity() {
        let publisher = MemoryPublisher::with_capacity(3);
        for id in 1..=5 {
            publisher.publish(&message(&format!("build-{}", id))).await.unwrap();
        }

        assert_eq!(publisher.len().await, 3);
        let queues: Vec<String> = publisher
            .messages()
            .await
            .into_iter()
            .map(|m| m.queue)
            .collect();
        assert_eq!(queues, vec!["build-3", "build-4", "build-5"]);
    }

    #[tokio::test]
    async fn test_zero_capacity_keeps_latest() {
        let publisher = MemoryPublisher::with_capacity(0);
        assert_eq!(publisher.capacity(), 1);

        publisher.publish(&message("builds")).await.unwrap();
        publisher.publish(&message("jobs")).await.unwrap();
        assert_eq!(publisher.messages_for("jobs").await.len(), 1);
        assert_eq!(publisher.len().await, 1);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let publisher = MemoryPublisher::new();
        publisher.fail_with(Some("over quota".to_string())).await;

        let err = publisher.publish(&message("builds")).await.unwrap_err();
        assert!(matches!(err, PublishError::Rejected(reason) if reason == "over quota"));
        assert!(publisher.is_empty().await);

        publisher.fail_with(None).await;
        publisher.publish(&message("builds")).await.unwrap();
        assert_eq!(publisher.len().await, 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let publisher = MemoryPublisher::new();
        publisher.publish(&message("builds")).await.unwrap();
        publisher.clear().await;
        assert!(publisher.is_empty().await);
    }
}
