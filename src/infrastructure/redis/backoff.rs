//! Reconnect delays for the Redis subscription loop

use std::time::Duration;

use rand::Rng;

use crate::config::RedisConfig;

#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay before the first reconnect, in milliseconds
    pub initial_delay_ms: u64,
    /// Upper bound for any delay, in milliseconds
    pub max_delay_ms: u64,
    pub multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
            multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl From<&RedisConfig> for BackoffConfig {
    fn from(config: &RedisConfig) -> Self {
        Self {
            initial_delay_ms: config.reconnect_initial_delay_ms,
            max_delay_ms: config.reconnect_max_delay_ms,
            ..Self::default()
        }
    }
}

/// Exponential reconnect backoff with jitter.
///
/// The n-th delay is `initial * multiplier^n`, capped at `max_delay_ms`,
/// then spread by up to `jitter_factor` in either direction.
pub struct ReconnectBackoff {
    config: BackoffConfig,
    attempt: u32,
}

impl ReconnectBackoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Delay to wait before the next reconnect attempt
    pub fn next_delay(&mut self) -> Duration {
        let base = self.config.initial_delay_ms as f64
            * self.config.multiplier.powi(self.attempt.min(32) as i32);
        let capped = base.min(self.config.max_delay_ms as f64);
        self.attempt = self.attempt.saturating_add(1);

        let delay = if self.config.jitter_factor > 0.0 {
            let spread = capped * self.config.jitter_factor;
            capped + rand::rng().random_range(-spread..=spread)
        } else {
            capped
        };

        Duration::from_millis(delay.max(1.0) as u64)
    }

    /// Start over after a connection was established
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}
