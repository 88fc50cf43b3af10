// Infrastructure layer (shared components)
pub mod infrastructure;

pub use infrastructure::config;
pub use infrastructure::error;
pub use infrastructure::metrics;

// Domain layer
pub mod domain;
pub mod notification;

// Event plumbing
pub mod bus;
pub mod publisher;

// Application layer
pub mod api;
pub mod server;
pub mod triggers;

// Supporting modules
pub mod telemetry;
