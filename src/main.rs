use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use order_lifecycle::api;
use order_lifecycle::config::Config;
use order_lifecycle::domain::delivery::seed_deliveries;
use order_lifecycle::domain::order::OrderService;
use order_lifecycle::metrics::{self, Metrics};
use order_lifecycle::store::{EntityStore, InMemoryEntityStore};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_lifecycle=debug"))
        )
        .init();

    tracing::info!("🚀 Starting order lifecycle service");

    // === 1. Configuration ===
    let config = Config::from_env().await?;
    tracing::info!(
        http_port = config.http.port,
        metrics_enabled = config.metrics.enabled,
        max_attempts = config.store.max_attempts,
        timeout_ms = config.orders.operation_timeout_ms,
        "Configuration loaded"
    );

    // === 2. Document store ===
    let store: Arc<dyn EntityStore> = Arc::new(InMemoryEntityStore::with_retry(config.store.retry()));
    let seeded = seed_deliveries(&store, &config.deliveries).await?;
    if seeded == 0 {
        tracing::warn!("No couriers configured; assignments will fail until deliveries are written");
    } else {
        tracing::info!("🛵 Seeded {} couriers", seeded);
    }

    // === 3. Prometheus metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 4. Order service + HTTP ===
    let service = OrderService::new(store, metrics.clone(), config.orders.service());
    let api_server = api::start_api_server(service, config.http.host.clone(), config.http.port);

    if config.metrics.enabled {
        let metrics_server =
            metrics::start_metrics_server(metrics.registry().clone(), config.http.host.clone(), config.metrics.port);
        futures_util::future::try_join(api_server, metrics_server).await?;
    } else {
        api_server.await?;
    }

    tracing::info!("👋 Order lifecycle service stopped");
    Ok(())
}
