//! Prometheus metrics for the build notifier.
//!
//! - Inbound events received, by event name
//! - Messages published, by queue kind
//! - Dispatch and publish failures, by error kind
//! - Publish latency
//! - Redis subscription health

mod helpers;

pub use helpers::{encode_metrics, DispatchMetrics, RedisMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "notifier";

lazy_static! {
    // ============================================================================
    // Event Metrics
    // ============================================================================

    /// Events received from the bus, by event name
    pub static ref EVENTS_RECEIVED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_events_received_total", METRIC_PREFIX),
        "Total events received",
        &["event"]
    ).unwrap();

    /// Events that no handler was subscribed to
    pub static ref EVENTS_UNHANDLED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_events_unhandled_total", METRIC_PREFIX),
        "Total events dispatched without any subscribed handler"
    ).unwrap();

    // ============================================================================
    // Publish Metrics
    // ============================================================================

    /// Messages published, by queue kind (jobs, builds, build_log)
    pub static ref MESSAGES_PUBLISHED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_messages_published_total", METRIC_PREFIX),
        "Total messages published to the messaging provider",
        &["queue_kind"]
    ).unwrap();

    /// Failures while routing, building or publishing, by kind
    pub static ref DISPATCH_ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_dispatch_errors_total", METRIC_PREFIX),
        "Total dispatch failures",
        &["kind"]
    ).unwrap();

    /// Time spent in the provider publish call
    pub static ref PUBLISH_DURATION: Histogram = register_histogram!(
        format!("{}_publish_duration_seconds", METRIC_PREFIX),
        "Publish latency in seconds",
        vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    ).unwrap();

    // ============================================================================
    // Redis Metrics
    // ============================================================================

    /// Redis subscription status (1 = subscribed, 0 = disconnected)
    pub static ref REDIS_SUBSCRIPTION_STATUS: IntGauge = register_int_gauge!(
        format!("{}_redis_subscription_status", METRIC_PREFIX),
        "Redis subscription status (1=subscribed, 0=disconnected)"
    ).unwrap();

    /// Total Redis reconnection attempts
    pub static ref REDIS_RECONNECTIONS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_redis_reconnections_total", METRIC_PREFIX),
        "Total Redis reconnection attempts"
    ).unwrap();

    /// Redis pub/sub messages received
    pub static ref REDIS_MESSAGES_RECEIVED: IntCounter = register_int_counter!(
        format!("{}_redis_messages_received_total", METRIC_PREFIX),
        "Total messages received from Redis pub/sub"
    ).unwrap();

    /// Redis pub/sub messages that could not be parsed as events
    pub static ref REDIS_MESSAGES_INVALID: IntCounter = register_int_counter!(
        format!("{}_redis_messages_invalid_total", METRIC_PREFIX),
        "Total Redis pub/sub messages rejected as malformed"
    ).unwrap();
}
