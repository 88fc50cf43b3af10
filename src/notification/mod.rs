//! Build and job event notification.
//!
//! - `event`: accepted event kinds and job-event normalization
//! - `router`: queue selection
//! - `payload`: event-shaped payload projection
//! - `notifier`: the bus handler that publishes to the messaging provider
//!
//! Routing and payload building are pure functions; only the notifier
//! touches the network.

mod error;
mod event;
mod notifier;
mod payload;
mod router;

pub use error::{DispatchError, NotifierError};
pub use event::{BuildEvent, Event, EventKind, Extra, Normalized};
pub use notifier::{NotifierStatsSnapshot, PusherNotifier};
pub use payload::{build_payload, payload_for, Payload};
pub use router::{queue_for, route, Queue};

use std::borrow::Cow;

use crate::publisher::OutboundMessage;

/// A routed payload, ready to publish
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub queue: Queue,
    pub message: OutboundMessage,
}

/// Run the pure part of a dispatch: fill in the log of `build:log` events,
/// normalize, route, and build the payload.
pub fn prepare(event: &Event) -> Result<Delivery, DispatchError> {
    let event = with_log(event)?;
    let normalized = event.normalize()?;
    let queue = route(normalized.event, &normalized.subject)?;
    let payload = build_payload(normalized.event, &normalized.subject, &event.extra)?;

    Ok(Delivery {
        message: OutboundMessage {
            queue: queue.name(),
            event: normalized.event.as_str(),
            payload,
        },
        queue,
    })
}

/// Make sure a `build:log` event carries its log fragment, taking the
/// build's stored log when the event itself has none.
fn with_log(event: &Event) -> Result<Cow<'_, Event>, DispatchError> {
    if event.kind != EventKind::BuildLog || event.extra.log.is_some() {
        return Ok(Cow::Borrowed(event));
    }

    match &event.subject.owning_build()?.log {
        Some(log) => Ok(Cow::Owned(Event {
            extra: Extra {
                log: Some(log.clone()),
                ..event.extra.clone()
            },
            ..event.clone()
        })),
        None => Err(DispatchError::MissingExtraField("log")),
    }
}
