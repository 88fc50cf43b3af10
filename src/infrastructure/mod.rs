//! Infrastructure layer modules
//!
//! This module contains shared infrastructure components:
//! - `config`: Application configuration and settings
//! - `error`: HTTP-facing error type
//! - `metrics`: Prometheus metrics
//! - `redis`: Reconnection backoff for Redis subscriptions

pub mod config;
pub mod error;
pub mod metrics;
pub mod redis;
