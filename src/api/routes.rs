use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;
use crate::triggers::{dispatch_event, preview_event};

use super::health::{health, stats};
use super::metrics::prometheus_metrics;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health & Stats
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        // Event endpoints
        .nest(
            "/api/v1",
            Router::new()
                .route("/events", post(dispatch_event))
                .route("/events/preview", post(preview_event)),
        )
}
