//! Outbound side of the notifier: publishing payloads to the messaging provider.
//!
//! - `RedisPublisher`: publishes to Redis Pub/Sub channels named after the queue
//! - `MemoryPublisher`: records messages in memory (tests, local runs)
//!
//! Use `create_publisher()` to pick the implementation from configuration.

mod memory_backend;
mod redis_backend;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::{PublisherConfig, RedisConfig};
use crate::notification::Payload;

pub use memory_backend::{MemoryPublisher, DEFAULT_MAX_MESSAGES};
pub use redis_backend::RedisPublisher;

/// Errors that can occur while publishing a message.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Redis operation failed
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The provider refused the message
    #[error("Message rejected: {0}")]
    Rejected(String),
}

/// A payload addressed to a queue, ready to publish
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMessage {
    /// Queue (channel) name
    pub queue: String,
    /// Event name the payload is published as
    pub event: &'static str,
    pub payload: Payload,
}

/// Body of a message on the wire
#[derive(Serialize)]
struct WireMessage<'a> {
    event: &'a str,
    data: &'a Payload,
}

impl OutboundMessage {
    /// Serialize as `{"event": ..., "data": {...}}`, keeping payload key order
    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&WireMessage {
            event: self.event,
            data: &self.payload,
        })
    }
}

/// Trait for messaging provider clients.
///
/// Implementations never retry; a failed publish is returned to the caller.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Name of the backend, for logs and health output
    fn name(&self) -> &'static str;

    /// Publish a message to its queue
    async fn publish(&self, message: &OutboundMessage) -> Result<(), PublishError>;
}

/// Create a publisher based on configuration.
///
/// - `"redis"`: connects a `RedisPublisher` to `redis.url`
/// - `"memory"` (default): returns a `MemoryPublisher` holding at most
///   `max_messages`
pub async fn create_publisher(
    settings: &PublisherConfig,
    redis: &RedisConfig,
) -> Result<Arc<dyn MessagePublisher>, PublishError> {
    match settings.backend.as_str() {
        "redis" => {
            tracing::info!(
                backend = "redis",
                prefix = %settings.channel_prefix,
                "Creating Redis publisher"
            );
            let publisher = RedisPublisher::connect(&redis.url, &settings.channel_prefix).await?;
            Ok(Arc::new(publisher))
        }
        other => {
            if other != "memory" {
                tracing::warn!(backend = %other, "Unknown publisher backend, falling back to memory");
            }
            tracing::info!(
                backend = "memory",
                max_messages = settings.max_messages,
                "Creating memory publisher"
            );
            Ok(Arc::new(MemoryPublisher::with_capacity(settings.max_messages)))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_wire_format_keeps_payload_order() {
        let message = OutboundMessage {
            queue: "build-1".to_string(),
            event: "build:log",
            payload: Payload {
                build: json!({ "id": 1 }),
                repository: json!({ "id": 2 }),
                log: Some("foo".to_string()),
            },
        };

        assert_eq!(
            message.to_wire().unwrap(),
            r#"{"event":"build:log","data":{"build":{"id":1},"repository":{"id":2},"log":"foo"}}"#
        );
    }

    #[tokio::test]
    async fn test_factory_defaults_to_memory() {
        let settings = PublisherConfig {
            backend: "carrier-pigeon".to_string(),
            ..PublisherConfig::default()
        };
        let publisher = create_publisher(&settings, &RedisConfig::default())
            .await
            .unwrap();
        assert_eq!(publisher.name(), "memory");
    }
}
