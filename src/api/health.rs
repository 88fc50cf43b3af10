//! Health check and statistics endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::bus::RegistryStats;
use crate::notification::NotifierStatsSnapshot;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub publisher: String,
    pub notifications: Vec<String>,
    pub subscriptions: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub registry: RegistryStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pusher: Option<NotifierStatsSnapshot>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let subscriptions = state.registry.stats().total_subscriptions;

    // Nothing is delivered without subscriptions
    let status = if subscriptions > 0 { "healthy" } else { "idle" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        publisher: state.publisher.name().to_string(),
        notifications: state.settings.notifications.enabled.clone(),
        subscriptions,
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        registry: state.registry.stats(),
        pusher: state.notifier.as_ref().map(|notifier| notifier.stats()),
    })
}
