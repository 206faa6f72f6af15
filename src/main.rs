use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vcr_search::{
    api::{build_router, AppState},
    config::Config,
    search::SearchService,
    store::{Fixtures, InMemoryStore, ModelStore},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    let json_logs = config.observability.json_logs;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("vcr_search={},tower_http=info", config.observability.log_level).into()
            }),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    config.validate()?;

    tracing::info!(
        service = %config.observability.service_name,
        "Starting vcr-search v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!(
        max_results = config.search.max_results,
        page_size = config.search.page_size,
        "Result ceiling configured"
    );

    if config.observability.prometheus_enabled {
        if let Err(e) = vcr_search::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
            tracing::warn!("Continuing without metrics");
        } else {
            tracing::info!("Prometheus metrics initialized");
        }
    } else {
        tracing::info!("Prometheus metrics disabled in configuration");
    }

    let store: Arc<dyn ModelStore> = Arc::new(InMemoryStore::new());
    let service = Arc::new(SearchService::new(config.search.clone(), store).await?);
    tracing::info!(index_path = ?config.search.index_path, "Search service initialized");

    if let Some(ref path) = config.data.fixtures_path {
        let fixtures = Fixtures::from_path(path)?;
        tracing::info!(path = %path.display(), records = fixtures.len(), "Loading fixtures");
        service.index_fixtures(fixtures).await?;
    }

    let stats = service.get_stats().await?;
    tracing::info!(
        documents = stats.total_documents,
        segments = stats.num_segments,
        "Search index ready"
    );

    let app = build_router(AppState::new(service));

    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_addr).await?;

    tracing::info!("HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   Search API: http://{}/search/credentials", http_addr);

    let http_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(http_listener, app).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    tokio::select! {
        _ = http_handle => {
            tracing::warn!("HTTP server stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    tracing::info!("Shutting down gracefully...");
    Ok(())
}
