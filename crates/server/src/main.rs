use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use helios_core::{
    load_config, validate_config, Credentials, RefreshJob, SearchCache, SearchService,
    SourceRegistry, SqliteStore, UpstreamClient, VideoResolver, VideoStore,
};

use helios_server::api::create_router;
use helios_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
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

    // Owner credentials and subscription feed come from the environment.
    let credentials = Credentials::from_env().context("Environment validation failed")?;

    // Determine config path
    let config_path = std::env::var("HELIOS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;
    info!("Database path: {:?}", config.database.path);

    // Fetch the subscription before serving anything; an unreachable or
    // malformed feed is fatal at startup.
    let registry = Arc::new(SourceRegistry::new(credentials.subscription_url.clone()));
    registry
        .refresh()
        .await
        .context("Failed to fetch subscription")?;
    info!(sites = registry.len(), "Source registry initialized");

    let store: Arc<SqliteStore> = Arc::new(
        SqliteStore::new(&config.database.path).context("Failed to open record store")?,
    );
    info!("Record store initialized");

    let cache = Arc::new(SearchCache::new());
    let client = Arc::new(UpstreamClient::new(Arc::clone(&cache)));
    let search = Arc::new(SearchService::new(Arc::clone(&registry), client));

    // Hourly refresh of the subscription and saved records.
    let refresh_job = Arc::new(RefreshJob::new(
        Arc::clone(&registry),
        Arc::clone(&search) as Arc<dyn VideoResolver>,
        Arc::clone(&store) as Arc<dyn VideoStore>,
    ));
    let refresh_handle = tokio::spawn(Arc::clone(&refresh_job).run());
    info!("Refresh job started");

    let state = Arc::new(AppState::new(
        Arc::clone(&search),
        Arc::clone(&registry),
        store as Arc<dyn VideoStore>,
        credentials,
    ));

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    refresh_handle.abort();
    if let Err(e) = refresh_handle.await {
        if !e.is_cancelled() {
            warn!("Refresh job ended abnormally: {}", e);
        }
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
