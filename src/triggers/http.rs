use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Subject;
use crate::error::{AppError, Result};
use crate::notification::{self, Event, EventKind, Extra, Payload};
use crate::server::AppState;

/// Request to dispatch a domain event
#[derive(Debug, Deserialize)]
pub struct EventRequest {
    /// Event name (e.g., "build:started", "job:test:started")
    pub event: String,
    /// Entity the event is about
    pub subject: Subject,
    /// Auxiliary data, e.g. `{"log": "..."}` for `build:log`
    #[serde(default)]
    pub extra: Extra,
}

impl EventRequest {
    fn into_event(self) -> Result<Event> {
        let kind: EventKind = self.event.parse()?;
        Ok(Event::new(kind, self.subject).with_extra(self.extra))
    }
}

/// Response for event dispatch
#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub success: bool,
    pub dispatch_id: Uuid,
    pub event: EventKind,
    pub handled: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// What would be published for an event
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub queue: String,
    /// Event name the payload is published as, after normalization
    pub event: &'static str,
    pub payload: Payload,
}

/// POST /api/v1/events - dispatch an event to all subscribed handlers
pub async fn dispatch_event(
    State(state): State<AppState>,
    Json(request): Json<EventRequest>,
) -> Result<Json<DispatchResponse>> {
    let event = request.into_event()?;

    if state.registry.handler_count(event.kind) == 0 {
        return Err(AppError::Unavailable(format!(
            "no handler is subscribed to {}",
            event.kind
        )));
    }

    let summary = state.registry.dispatch(&event).await;

    Ok(Json(DispatchResponse {
        success: summary.success(),
        dispatch_id: summary.dispatch_id,
        event: summary.event,
        handled: summary.handled,
        failed: summary.failed,
        errors: summary.errors,
        timestamp: Utc::now(),
    }))
}

/// POST /api/v1/events/preview - route and build the payload without publishing
pub async fn preview_event(Json(request): Json<EventRequest>) -> Result<Json<PreviewResponse>> {
    let event = request.into_event()?;
    let delivery = notification::prepare(&event)?;

    Ok(Json(PreviewResponse {
        queue: delivery.message.queue,
        event: delivery.message.event,
        payload: delivery.message.payload,
    }))
}
