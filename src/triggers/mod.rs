//! Inbound event sources: Redis Pub/Sub and the HTTP API.

mod http;
mod redis;

pub use self::http::{dispatch_event, preview_event, EventRequest, PreviewResponse};
pub use self::redis::{parse_event, ParseError, RedisEventSubscriber};
