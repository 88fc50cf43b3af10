//! Redis connection support shared by the inbound subscriber.

mod backoff;

pub use backoff::{BackoffConfig, ReconnectBackoff};
