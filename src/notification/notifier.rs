use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;

use crate::bus::EventHandler;
use crate::metrics::DispatchMetrics;
use crate::publisher::MessagePublisher;

use super::{prepare, Delivery, DispatchError, Event, EventKind, NotifierError};

/// Counters for the notifier
#[derive(Debug, Default)]
struct NotifierStats {
    published: AtomicU64,
    dispatch_failed: AtomicU64,
    publish_failed: AtomicU64,
}

/// Snapshot of notifier statistics
#[derive(Debug, Clone, Serialize)]
pub struct NotifierStatsSnapshot {
    pub published: u64,
    pub dispatch_failed: u64,
    pub publish_failed: u64,
}

/// Publishes build and job events to the real-time messaging provider.
///
/// Routing and payload errors are returned as is; a failed publish is not
/// retried.
pub struct PusherNotifier {
    publisher: Arc<dyn MessagePublisher>,
    stats: NotifierStats,
}

impl PusherNotifier {
    pub fn new(publisher: Arc<dyn MessagePublisher>) -> Self {
        Self {
            publisher,
            stats: NotifierStats::default(),
        }
    }

    pub fn stats(&self) -> NotifierStatsSnapshot {
        NotifierStatsSnapshot {
            published: self.stats.published.load(Ordering::Relaxed),
            dispatch_failed: self.stats.dispatch_failed.load(Ordering::Relaxed),
            publish_failed: self.stats.publish_failed.load(Ordering::Relaxed),
        }
    }

    /// Normalize, route, build and publish one event
    #[tracing::instrument(
        name = "pusher.notify",
        skip(self, event),
        fields(event = %event.kind, subject = %event.subject.kind(), subject_id = event.subject.id())
    )]
    pub async fn notify(&self, event: &Event) -> Result<Delivery, NotifierError> {
        let delivery = prepare(event).map_err(|e| self.dispatch_failed(e))?;

        let started = Instant::now();
        if let Err(e) = self.publisher.publish(&delivery.message).await {
            self.stats.publish_failed.fetch_add(1, Ordering::Relaxed);
            DispatchMetrics::record_error("publish");
            tracing::warn!(queue = %delivery.queue, error = %e, "Publish failed");
            return Err(e.into());
        }

        self.stats.published.fetch_add(1, Ordering::Relaxed);
        DispatchMetrics::record_published(delivery.queue.label(), started.elapsed().as_secs_f64());

        tracing::debug!(
            queue = %delivery.queue,
            published_as = %delivery.message.event,
            keys = ?delivery.message.payload.keys(),
            "Event published"
        );

        Ok(delivery)
    }

    fn dispatch_failed(&self, err: DispatchError) -> NotifierError {
        self.stats.dispatch_failed.fetch_add(1, Ordering::Relaxed);
        DispatchMetrics::record_error(err.kind());
        tracing::warn!(error = %err, kind = err.kind(), "Event could not be dispatched");
        err.into()
    }
}

#[async_trait]
impl EventHandler for PusherNotifier {
    fn name(&self) -> &'static str {
        "pusher"
    }

    fn event_kinds(&self) -> Vec<EventKind> {
        EventKind::ALL.to_vec()
    }

    async fn handle(&self, event: &Event) -> anyhow::Result<()> {
        self.notify(event).await?;
        Ok(())
    }
}
