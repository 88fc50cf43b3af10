use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::metrics::DispatchMetrics;
use crate::notification::{DispatchError, Event, EventKind};

use super::EventHandler;

/// Outcome of delivering one event to its handlers
#[derive(Debug, Clone, Serialize)]
pub struct DispatchSummary {
    pub dispatch_id: Uuid,
    pub event: EventKind,
    /// Handlers that processed the event
    pub handled: usize,
    /// Handlers that returned an error
    pub failed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl DispatchSummary {
    fn new(event: EventKind) -> Self {
        Self {
            dispatch_id: Uuid::new_v4(),
            event,
            handled: 0,
            failed: 0,
            errors: Vec::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    /// Subscriptions per event name
    pub subscriptions: HashMap<&'static str, usize>,
    pub total_subscriptions: usize,
}

/// Event name -> handlers subscribed to it
pub struct SubscriptionRegistry {
    subscriptions: DashMap<EventKind, Vec<Arc<dyn EventHandler>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            subscriptions: DashMap::new(),
        }
    }

    /// Subscribe a handler to one event name or to a `prefix*` pattern
    /// (e.g. `build:*`). Returns the number of event kinds subscribed.
    pub fn subscribe(
        &self,
        pattern: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<usize, DispatchError> {
        let kinds: Vec<EventKind> = match pattern.strip_suffix('*') {
            Some(prefix) => EventKind::ALL
                .into_iter()
                .filter(|kind| kind.as_str().starts_with(prefix))
                .collect(),
            None => vec![pattern.parse::<EventKind>()?],
        };

        if kinds.is_empty() {
            return Err(DispatchError::UnroutableEvent(pattern.to_string()));
        }

        for kind in &kinds {
            self.subscribe_kind(*kind, handler.clone());
        }

        Ok(kinds.len())
    }

    pub fn subscribe_kind(&self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        tracing::debug!(event = %kind, handler = handler.name(), "Handler subscribed");
        self.subscriptions.entry(kind).or_default().push(handler);
    }

    /// Subscribe a handler to every kind it declares
    pub fn register(&self, handler: Arc<dyn EventHandler>) {
        let kinds = handler.event_kinds();
        tracing::info!(
            handler = handler.name(),
            events = ?kinds.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
            "Handler registered"
        );

        for kind in kinds {
            self.subscribe_kind(kind, handler.clone());
        }
    }

    /// Drop every subscription
    pub fn clear(&self) {
        self.subscriptions.clear();
        tracing::debug!("Subscriptions cleared");
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.subscriptions
            .get(&kind)
            .map(|handlers| handlers.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.iter().all(|entry| entry.value().is_empty())
    }

    pub fn stats(&self) -> RegistryStats {
        let subscriptions: HashMap<&'static str, usize> = self
            .subscriptions
            .iter()
            .map(|entry| (entry.key().as_str(), entry.value().len()))
            .collect();
        let total_subscriptions = subscriptions.values().sum();

        RegistryStats {
            subscriptions,
            total_subscriptions,
        }
    }

    /// Deliver an event to every handler subscribed to its name.
    ///
    /// Handler errors are logged and counted in the summary; they never stop
    /// delivery to the remaining handlers.
    #[tracing::instrument(name = "bus.dispatch", skip(self, event), fields(event = %event.kind))]
    pub async fn dispatch(&self, event: &Event) -> DispatchSummary {
        DispatchMetrics::record_received(event.name());

        // Clone the handler list so no map guard is held across an await
        let handlers: Vec<Arc<dyn EventHandler>> = self
            .subscriptions
            .get(&event.kind)
            .map(|handlers| handlers.value().clone())
            .unwrap_or_default();

        let mut summary = DispatchSummary::new(event.kind);

        if handlers.is_empty() {
            DispatchMetrics::record_unhandled();
            tracing::debug!("No handler subscribed");
            return summary;
        }

        for handler in handlers {
            match handler.handle(event).await {
                Ok(()) => summary.handled += 1,
                Err(e) => {
                    tracing::warn!(handler = handler.name(), error = %e, "Handler failed");
                    summary.failed += 1;
                    summary.errors.push(format!("{}: {}", handler.name(), e));
                }
            }
        }

        summary
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::Build;

    /// Records the order in which handlers saw events
    struct Recorder {
        name: &'static str,
        kinds: Vec<EventKind>,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl EventHandler for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn event_kinds(&self) -> Vec<EventKind> {
            self.kinds.clone()
        }

        async fn handle(&self, event: &Event) -> anyhow::Result<()> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, event.name()));
            if self.fail {
                anyhow::bail!("boom");
            }
            Ok(())
        }
    }

    fn recorder(name: &'static str, log: &Arc<Mutex<Vec<String>>>, fail: bool) -> Arc<Recorder> {
        Arc::new(Recorder {
            name,
            kinds: vec![EventKind::BuildStarted],
            log: log.clone(),
            fail,
        })
    }

    #[tokio::test]
    async fn test_handlers_run_in_registration_order() {
        let registry = SubscriptionRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.register(recorder("a", &log, false));
        registry.register(recorder("b", &log, false));

        let summary = registry
            .dispatch(&Event::new(EventKind::BuildStarted, Build::new(1)))
            .await;

        assert_eq!(summary.handled, 2);
        assert!(summary.success());
        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:build:started".to_string(), "b:build:started".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_stop_delivery() {
        let registry = SubscriptionRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.register(recorder("a", &log, true));
        registry.register(recorder("b", &log, false));

        let summary = registry
            .dispatch(&Event::new(EventKind::BuildStarted, Build::new(1)))
            .await;

        assert_eq!((summary.handled, summary.failed), (1, 1));
        assert_eq!(summary.errors, vec!["a: boom".to_string()]);
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unsubscribed_event_is_not_handled() {
        let registry = SubscriptionRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.register(recorder("a", &log, false));

        let summary = registry
            .dispatch(&Event::new(EventKind::BuildFinished, Build::new(1)))
            .await;

        assert_eq!(summary.handled, 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_subscribe_pattern() {
        let registry = SubscriptionRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let count = registry.subscribe("build:*", recorder("a", &log, false)).unwrap();
        assert_eq!(count, 5);
        assert_eq!(registry.handler_count(EventKind::BuildLog), 1);
        assert_eq!(registry.handler_count(EventKind::JobTestStarted), 0);

        registry
            .subscribe("job:test:started", recorder("b", &log, false))
            .unwrap();
        assert_eq!(registry.handler_count(EventKind::JobTestStarted), 1);
        assert_eq!(registry.stats().total_subscriptions, 6);
    }

    #[test]
    fn test_subscribe_unknown_name_fails() {
        let registry = SubscriptionRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        assert!(registry.subscribe("repository:*", recorder("a", &log, false)).is_err());
        assert!(registry.subscribe("build:exploded", recorder("a", &log, false)).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clear_resets_registry() {
        let registry = SubscriptionRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.register(recorder("a", &log, false));
        assert!(!registry.is_empty());

        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.handler_count(EventKind::BuildStarted), 0);
    }
}
