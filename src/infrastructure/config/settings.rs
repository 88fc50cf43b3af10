use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;

/// Variables whose key contains an underscore. The `_` separator would
/// split them into nested keys, so they are mapped explicitly.
const MULTI_WORD_KEYS: &[(&str, &str)] = &[
    ("PUBLISHER_CHANNEL_PREFIX", "publisher.channel_prefix"),
    ("PUBLISHER_MAX_MESSAGES", "publisher.max_messages"),
    ("REDIS_RECONNECT_INITIAL_DELAY_MS", "redis.reconnect_initial_delay_ms"),
    ("REDIS_RECONNECT_MAX_DELAY_MS", "redis.reconnect_max_delay_ms"),
    ("OTEL_SERVICE_NAME", "otel.service_name"),
    ("OTEL_SAMPLING_RATIO", "otel.sampling_ratio"),
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Which notification backends are active
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_enabled_notifications")]
    pub enabled: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Inbound event channels; patterns are subscribed with PSUBSCRIBE
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default = "default_reconnect_initial_delay_ms")]
    pub reconnect_initial_delay_ms: u64,
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublisherConfig {
    /// "redis" or "memory"
    #[serde(default = "default_publisher_backend")]
    pub backend: String,
    /// Prepended to the queue name to form the outbound channel
    #[serde(default)]
    pub channel_prefix: String,
    /// Messages the memory backend keeps before dropping the oldest
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_enabled_notifications() -> Vec<String> {
    vec!["pusher".to_string()]
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_reconnect_initial_delay_ms() -> u64 {
    500
}

fn default_reconnect_max_delay_ms() -> u64 {
    30_000 // 30 seconds
}

fn default_publisher_backend() -> String {
    "memory".to_string()
}

fn default_max_messages() -> usize {
    10_000
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "build-notifier".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let vars = env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();

        Self::load(&run_mode, vars)
    }

    /// Layer defaults, config files and `vars` (highest priority)
    fn load(run_mode: &str, vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("notifications.enabled", default_enabled_notifications())?
            .set_default("redis.url", default_redis_url())?
            .set_default("publisher.backend", default_publisher_backend())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // SERVER_PORT, NOTIFICATIONS_ENABLED=pusher, REDIS_URL, REDIS_CHANNELS=a,b, ...
            .add_source(
                Environment::default()
                    .separator("_")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("notifications.enabled")
                    .with_list_parse_key("redis.channels")
                    .source(Some(vars.clone())),
            );

        for (var, key) in MULTI_WORD_KEYS {
            builder = builder.set_override_option(*key, vars.get(*var).cloned())?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Whether a notification backend (e.g. "pusher") is switched on
    pub fn notification_enabled(&self, name: &str) -> bool {
        self.notifications.enabled.iter().any(|n| n == name)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_notifications(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            channels: vec![],
            reconnect_initial_delay_ms: default_reconnect_initial_delay_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
        }
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            backend: default_publisher_backend(),
            channel_prefix: String::new(),
            max_messages: default_max_messages(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}
