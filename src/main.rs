use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, fmt};

use eventing::shared::infrastructure::event_publisher::tracing_log::TracingEventPublisher;
use eventing::shared::infrastructure::event_store::in_memory::InMemoryEventStore;
use eventing::shared::infrastructure::metrics_registry::facade::MetricsFacadeRegistry;
use eventing::shell::config::StoreConfig;
use eventing::shell::http::router;
use eventing::shell::state::AppState;
use eventing::shell::workers::BackgroundWorkers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = StoreConfig::from_env()?;

    let store = Arc::new(
        InMemoryEventStore::<Value>::new()
            .with_eviction_policy(config.eviction_policy())
            .with_publisher(Arc::new(TracingEventPublisher)),
    );

    let registry = MetricsFacadeRegistry::new();
    registry.describe();
    let workers = BackgroundWorkers::spawn(store.clone(), Arc::new(registry), &config);

    let app = router(AppState { event_store: store }).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    tracing::info!("Event store endpoint: http://{}/aggregates", config.http_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    workers.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "failed to listen for ctrl-c, shutting down");
    }
}
