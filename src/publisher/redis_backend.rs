//! Redis Pub/Sub publisher.
//!
//! Each queue maps to the channel `{prefix}{queue}`; the message body is the
//! JSON wire form of the outbound message.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::{MessagePublisher, OutboundMessage, PublishError};

pub struct RedisPublisher {
    connection: ConnectionManager,
    channel_prefix: String,
}

impl RedisPublisher {
    /// Connect to Redis. The connection manager reconnects on its own after
    /// the initial connection succeeds.
    pub async fn connect(url: &str, channel_prefix: &str) -> Result<Self, PublishError> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;

        tracing::info!(url = %url, "Redis publisher connected");

        Ok(Self {
            connection,
            channel_prefix: channel_prefix.to_string(),
        })
    }

    pub fn channel_for(&self, queue: &str) -> String {
        channel_name(&self.channel_prefix, queue)
    }
}

fn channel_name(prefix: &str, queue: &str) -> String {
    format!("{}{}", prefix, queue)
}

#[async_trait]
impl MessagePublisher for RedisPublisher {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn publish(&self, message: &OutboundMessage) -> Result<(), PublishError> {
        let channel = self.channel_for(&message.queue);
        let body = message.to_wire()?;

        let mut conn = self.connection.clone();
        let receivers: i64 = conn.publish(&channel, body).await?;

        tracing::debug!(
            channel = %channel,
            event = %message.event,
            receivers = receivers,
            "Published to Redis"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_name() {
        assert_eq!(channel_name("pusher:", "build-1"), "pusher:build-1");
        assert_eq!(channel_name("", "jobs"), "jobs");
    }
}
