//! In-process event bus.
//!
//! Handlers register with a [`SubscriptionRegistry`] owned by the
//! composition root; events are delivered inline, in registration order,
//! on the dispatching task.

mod registry;

use async_trait::async_trait;

use crate::notification::{Event, EventKind};

pub use registry::{DispatchSummary, RegistryStats, SubscriptionRegistry};

/// A consumer of bus events
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Name for logs and stats
    fn name(&self) -> &'static str;

    /// Event kinds the handler subscribes to when registered
    fn event_kinds(&self) -> Vec<EventKind>;

    async fn handle(&self, event: &Event) -> anyhow::Result<()>;
}
