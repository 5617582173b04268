use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tellysync_core::{
    create_authenticator, load_config, validate_config, Authenticator, CatalogCache,
    ChannelMetrics, NotionClient, SeriesCatalog, SonarrClient, SyncOrchestrator, TableDirectory,
    TabularStore, WebhookReconciler, YouTubeClient,
};

use tellysync_server::api::create_router;
use tellysync_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

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

    // Determine config path
    let config_path = std::env::var("TELLYSYNC_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("tellysync {} starting", VERSION);
    info!("Auth method: {:?}", config.auth.method);

    // Log a config fingerprint so deployments are distinguishable
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!("Config hash: {}", &config_hash[..16]);

    // Create authenticator
    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    // The catalog cache is shared by the client and the webhook reconciler
    let cache = Arc::new(
        config
            .sonarr
            .as_ref()
            .map(|s| CatalogCache::new(Duration::from_secs(s.cache_refresh_hours * 3600)))
            .unwrap_or_default(),
    );
    let reconciler = Arc::new(WebhookReconciler::new(Arc::clone(&cache)));

    // Create the Sonarr client if configured
    let sonarr: Option<Arc<SonarrClient>> = match &config.sonarr {
        Some(sonarr_config) => {
            info!("Initializing Sonarr client at {}", sonarr_config.base_url);
            Some(Arc::new(
                SonarrClient::new(sonarr_config, Arc::clone(&cache))
                    .context("Failed to create Sonarr client")?,
            ))
        }
        None => {
            info!("No Sonarr client configured");
            None
        }
    };

    // Create the Notion client if configured
    let notion: Option<Arc<NotionClient>> = match &config.notion {
        Some(notion_config) => {
            info!("Initializing Notion client");
            Some(Arc::new(
                NotionClient::new(notion_config).context("Failed to create Notion client")?,
            ))
        }
        None => {
            info!("No Notion client configured");
            None
        }
    };

    // Create the YouTube client if configured
    let youtube: Option<Arc<YouTubeClient>> = match &config.youtube {
        Some(youtube_config) => {
            info!("Initializing YouTube client");
            Some(Arc::new(
                YouTubeClient::new(youtube_config).context("Failed to create YouTube client")?,
            ))
        }
        None => {
            info!("No YouTube client configured");
            None
        }
    };

    // Create the sync orchestrator if enabled
    let orchestrator = if config.sync.enabled {
        match (&sonarr, &notion, &youtube, &config.youtube) {
            (Some(sonarr), Some(notion), Some(youtube), Some(youtube_config)) => {
                info!("Initializing sync orchestrator");

                // Pre-warm the catalog cache; a failure here is fatal to
                // the startup sequence.
                sonarr
                    .initialize_cache()
                    .await
                    .context("Failed to pre-warm catalog cache")?;

                let store = Arc::clone(notion) as Arc<dyn TabularStore>;
                let tables = Arc::new(TableDirectory::new(
                    Arc::clone(&store),
                    config.sync.parent_page_id.clone(),
                ));

                let orchestrator = Arc::new(SyncOrchestrator::new(
                    config.sync.clone(),
                    youtube_config.channel.clone(),
                    Arc::clone(sonarr) as Arc<dyn SeriesCatalog>,
                    Arc::clone(youtube) as Arc<dyn ChannelMetrics>,
                    store,
                    tables,
                ));

                Arc::clone(&orchestrator).start().await;
                info!("Sync orchestrator started");
                Some(orchestrator)
            }
            _ => {
                error!(
                    "Sync enabled but missing dependencies (sonarr: {}, notion: {}, youtube: {})",
                    sonarr.is_some(),
                    notion.is_some(),
                    youtube.is_some()
                );
                None
            }
        }
    } else {
        info!("Sync disabled in config");
        None
    };

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        authenticator,
        cache,
        reconciler,
        sonarr.map(|c| c as Arc<dyn SeriesCatalog>),
        orchestrator.clone(),
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop orchestrator if running
    if let Some(ref orchestrator) = orchestrator {
        info!("Stopping sync orchestrator...");
        orchestrator.stop().await;
        info!("Sync orchestrator stopped");
    }

    info!("Server shut down");
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
}
