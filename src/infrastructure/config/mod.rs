mod settings;

pub use settings::{
    NotificationsConfig, OtelConfig, PublisherConfig, RedisConfig, ServerConfig, Settings,
};
