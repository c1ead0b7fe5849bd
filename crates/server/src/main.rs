use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use indexgate_core::status::EscalationBackoff;
use indexgate_core::{
    create_resolver, load_config, validate_config, ConfigDefinitionSource, IndexerCatalog,
    ProviderRegistry, ProviderStatusStore,
};
use indexgate_server::{create_router, AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("INDEXGATE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;
    info!("Configuration loaded successfully");

    // Failure tracking
    let backoff = EscalationBackoff::from(&config.status);
    info!(
        initial_secs = config.status.initial_backoff_secs,
        max_secs = config.status.max_backoff_secs,
        "Indexer failure backoff configured"
    );
    let status_store = Arc::new(ProviderStatusStore::new(backoff));

    // URL substitution
    let resolver = create_resolver(&config.substitution)
        .context("Failed to create substitution resolver")?;
    if resolver.is_enabled() {
        info!(source = ?config.substitution.source, "URL substitution enabled");
    } else {
        info!("URL substitution disabled");
    }

    // Registry, backed by the [[indexers]] section of the config file
    let catalog = IndexerCatalog::with_builtins();
    info!(implementations = ?catalog.implementations(), "Indexer catalog ready");
    let registry = Arc::new(
        ProviderRegistry::new(catalog, status_store, Arc::new(resolver))
            .with_source(Arc::new(ConfigDefinitionSource::from_path(config_path.clone()))),
    );
    let report = registry
        .reload()
        .await
        .context("Failed to load indexer definitions")?;
    if !report.rejected.is_empty() {
        warn!(
            rejected = report.rejected.len(),
            "Some indexer definitions were rejected"
        );
    }

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, registry));

    // Create router
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
