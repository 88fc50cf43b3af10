use prometheus::{Encoder, TextEncoder};

use super::{
    DISPATCH_ERRORS_TOTAL, EVENTS_RECEIVED_TOTAL, EVENTS_UNHANDLED_TOTAL, MESSAGES_PUBLISHED_TOTAL,
    PUBLISH_DURATION, REDIS_MESSAGES_INVALID, REDIS_MESSAGES_RECEIVED, REDIS_RECONNECTIONS_TOTAL,
    REDIS_SUBSCRIPTION_STATUS,
};

/// Encode all registered metrics in the Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording dispatch metrics
pub struct DispatchMetrics;

impl DispatchMetrics {
    pub fn record_received(event: &str) {
        EVENTS_RECEIVED_TOTAL.with_label_values(&[event]).inc();
    }

    pub fn record_unhandled() {
        EVENTS_UNHANDLED_TOTAL.inc();
    }

    pub fn record_published(queue_kind: &str, seconds: f64) {
        MESSAGES_PUBLISHED_TOTAL.with_label_values(&[queue_kind]).inc();
        PUBLISH_DURATION.observe(seconds);
    }

    pub fn record_error(kind: &str) {
        DISPATCH_ERRORS_TOTAL.with_label_values(&[kind]).inc();
    }
}

/// Helper struct for recording Redis subscription metrics
pub struct RedisMetrics;

impl RedisMetrics {
    pub fn set_subscribed(subscribed: bool) {
        REDIS_SUBSCRIPTION_STATUS.set(if subscribed { 1 } else { 0 });
    }

    pub fn record_reconnect() {
        REDIS_RECONNECTIONS_TOTAL.inc();
    }

    pub fn record_received() {
        REDIS_MESSAGES_RECEIVED.inc();
    }

    pub fn record_invalid() {
        REDIS_MESSAGES_INVALID.inc();
    }
}
