use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;

use build_notifier::config::Settings;
use build_notifier::server::{create_app, AppState};
use build_notifier::telemetry::init_telemetry;
use build_notifier::triggers::RedisEventSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing; keep the guard alive until shutdown
    let _telemetry = init_telemetry(&settings.otel)?;
    tracing::info!("Configuration loaded");

    // Create application state (publisher, registry, notifier)
    let state = AppState::from_settings(settings.clone()).await?;
    tracing::info!(
        publisher = state.publisher.name(),
        subscriptions = state.registry.stats().total_subscriptions,
        "Application state initialized"
    );

    // Inbound events from Redis
    let redis_subscriber = Arc::new(RedisEventSubscriber::new(
        settings.redis.clone(),
        state.registry.clone(),
    ));
    let shutdown_signal = redis_subscriber.shutdown_signal();

    let redis_subscriber_clone = redis_subscriber.clone();
    let redis_handle = tokio::spawn(async move {
        if let Err(e) = redis_subscriber_clone.start().await {
            tracing::error!(error = %e, "Redis event subscriber failed");
        }
    });

    let app = create_app(state);

    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_handler(shutdown_signal))
        .await?;

    tracing::info!("Waiting for Redis subscriber to finish...");
    let _ = redis_handle.await;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal_handler(shutdown_tx: tokio::sync::broadcast::Sender<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }

    // Stop the Redis subscriber
    let _ = shutdown_tx.send(());
}
