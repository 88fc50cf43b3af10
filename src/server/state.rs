use std::sync::Arc;
use std::time::Instant;

use crate::bus::SubscriptionRegistry;
use crate::config::Settings;
use crate::notification::PusherNotifier;
use crate::publisher::{create_publisher, MessagePublisher, PublishError};

/// Name of the notifier in `notifications.enabled`
pub const PUSHER: &str = "pusher";

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub registry: Arc<SubscriptionRegistry>,
    pub publisher: Arc<dyn MessagePublisher>,
    /// Present when the pusher notifier is enabled
    pub notifier: Option<Arc<PusherNotifier>>,
    pub start_time: Instant,
}

impl AppState {
    /// Wire the registry and notifier around an existing publisher
    pub fn new(settings: Settings, publisher: Arc<dyn MessagePublisher>) -> Self {
        let registry = Arc::new(SubscriptionRegistry::new());

        let notifier = if settings.notification_enabled(PUSHER) {
            let notifier = Arc::new(PusherNotifier::new(publisher.clone()));
            registry.register(notifier.clone());
            Some(notifier)
        } else {
            tracing::info!("Pusher notifications disabled");
            None
        };

        Self {
            settings: Arc::new(settings),
            registry,
            publisher,
            notifier,
            start_time: Instant::now(),
        }
    }

    /// Create the configured publisher, then wire everything around it
    pub async fn from_settings(settings: Settings) -> Result<Self, PublishError> {
        let publisher = create_publisher(&settings.publisher, &settings.redis).await?;
        Ok(Self::new(settings, publisher))
    }
}
