use std::sync::Arc;

use futures::StreamExt;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::bus::{DispatchSummary, SubscriptionRegistry};
use crate::config::RedisConfig;
use crate::domain::Subject;
use crate::infrastructure::redis::{BackoffConfig, ReconnectBackoff};
use crate::metrics::{DispatchMetrics, RedisMetrics};
use crate::notification::{DispatchError, Event, EventKind, Extra};

/// Channel used when none is configured
const DEFAULT_CHANNEL: &str = "notifier:events";

#[derive(Debug, Error)]
pub enum ParseError {
    /// Not JSON, or not shaped like an event
    #[error("Malformed event message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Well-formed, but the event name has no route
    #[error(transparent)]
    Unroutable(#[from] DispatchError),
}

/// Event message as read off the wire; the name is checked after decoding
#[derive(Deserialize)]
struct EventMessage {
    event: String,
    subject: Subject,
    #[serde(default)]
    extra: Extra,
}

/// Parse a Pub/Sub message body.
///
/// Expected form:
/// `{"event": "build:log", "subject": {"type": "build", "id": 1, ...}, "extra": {"log": "..."}}`
pub fn parse_event(payload: &str) -> Result<Event, ParseError> {
    let message: EventMessage = serde_json::from_str(payload)?;
    let kind: EventKind = message.event.parse()?;
    Ok(Event::new(kind, message.subject).with_extra(message.extra))
}

/// Redis Pub/Sub subscriber feeding domain events into the registry
pub struct RedisEventSubscriber {
    config: RedisConfig,
    registry: Arc<SubscriptionRegistry>,
    shutdown: broadcast::Sender<()>,
}

impl RedisEventSubscriber {
    pub fn new(config: RedisConfig, registry: Arc<SubscriptionRegistry>) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            config,
            registry,
            shutdown,
        }
    }

    /// Get a shutdown signal sender
    pub fn shutdown_signal(&self) -> broadcast::Sender<()> {
        self.shutdown.clone()
    }

    /// Run until a shutdown signal arrives, reconnecting with backoff on errors
    pub async fn start(&self) -> anyhow::Result<()> {
        let channels = self.channels();
        tracing::info!(channels = ?channels, "Starting Redis event subscriber");

        let mut backoff = ReconnectBackoff::new(BackoffConfig::from(&self.config));
        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            match self.run_subscription_loop(&channels, &mut backoff).await {
                Ok(()) => {
                    tracing::info!("Redis event subscriber stopped gracefully");
                    break;
                }
                Err(e) => {
                    RedisMetrics::set_subscribed(false);
                    RedisMetrics::record_reconnect();
                    let delay = backoff.next_delay();
                    tracing::error!(
                        error = %e,
                        attempt = backoff.attempt(),
                        delay_ms = delay.as_millis() as u64,
                        "Redis subscription error, reconnecting"
                    );

                    tokio::select! {
                        _ = shutdown_rx.recv() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        RedisMetrics::set_subscribed(false);
        Ok(())
    }

    fn channels(&self) -> Vec<String> {
        if self.config.channels.is_empty() {
            vec![DEFAULT_CHANNEL.to_string()]
        } else {
            self.config.channels.clone()
        }
    }

    async fn run_subscription_loop(
        &self,
        channels: &[String],
        backoff: &mut ReconnectBackoff,
    ) -> anyhow::Result<()> {
        let client = redis::Client::open(self.config.url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;

        // Subscribe to channels (with pattern support)
        for channel in channels {
            if channel.contains('*') || channel.contains('?') || channel.contains('[') {
                pubsub.psubscribe(channel).await?;
                tracing::debug!(pattern = %channel, "Subscribed to pattern");
            } else {
                pubsub.subscribe(channel).await?;
                tracing::debug!(channel = %channel, "Subscribed to channel");
            }
        }

        tracing::info!("Redis subscription established");
        RedisMetrics::set_subscribed(true);
        backoff.reset();

        let mut message_stream = pubsub.on_message();
        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Received shutdown signal");
                    return Ok(());
                }
                msg = message_stream.next() => {
                    let Some(msg) = msg else {
                        anyhow::bail!("Redis message stream ended");
                    };

                    let channel = msg.get_channel_name().to_string();
                    let payload: String = match msg.get_payload() {
                        Ok(p) => p,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to get message payload");
                            continue;
                        }
                    };

                    self.handle_message(&channel, &payload).await;
                }
            }
        }
    }

    /// Parse and dispatch one message. Malformed and unroutable messages are
    /// logged and dropped.
    pub async fn handle_message(&self, channel: &str, payload: &str) -> Option<DispatchSummary> {
        RedisMetrics::record_received();

        let event = match parse_event(payload) {
            Ok(event) => event,
            Err(ParseError::Unroutable(e)) => {
                DispatchMetrics::record_error(e.kind());
                tracing::warn!(
                    error = %e,
                    channel = %channel,
                    "Dropping Redis event without a route"
                );
                return None;
            }
            Err(e) => {
                RedisMetrics::record_invalid();
                tracing::warn!(
                    error = %e,
                    channel = %channel,
                    payload = %payload,
                    "Failed to parse Redis event"
                );
                return None;
            }
        };

        let summary = self.registry.dispatch(&event).await;

        tracing::debug!(
            channel = %channel,
            event = %event.kind,
            handled = summary.handled,
            failed = summary.failed,
            "Dispatched event from Redis"
        );

        Some(summary)
    }
}
