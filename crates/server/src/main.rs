use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use composer_core::{
    load_config, validate_config, CommandEngineFactory, CommandRunner, ComposerService,
    FfprobeInspectionService, FsWorkspace, InMemoryJobStore, JobStore, Listeners,
    StaticProfileRegistry,
};
use composer_server::api::create_router;
use composer_server::state::AppState;

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
    let config_path = std::env::var("COMPOSER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Workspace root: {:?}", config.workspace.root);
    info!(
        "Dispatch mode: {:?}, max workers: {}",
        config.composer.dispatch, config.composer.max_workers
    );

    tokio::fs::create_dir_all(&config.workspace.root)
        .await
        .with_context(|| format!("Failed to create workspace {:?}", config.workspace.root))?;

    // Shared job bookkeeping for composer and inspection jobs
    let jobs: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    let workspace = Arc::new(FsWorkspace::new(config.workspace.clone()));

    let profiles = StaticProfileRegistry::new(config.profiles.clone());
    info!("Loaded {} encoding profiles", profiles.len());

    let runner = Arc::new(CommandRunner::new(config.engine.working_dir.clone()));
    let engines = CommandEngineFactory::new(&config.engine, runner, Listeners::new());
    info!("Registered engines: {}", engines.engine_names().join(", "));

    let inspection = FfprobeInspectionService::new(
        config.inspection.clone(),
        Arc::clone(&jobs),
        workspace.clone(),
    );

    let composer = ComposerService::new(
        config.composer.clone(),
        jobs,
        workspace,
        Arc::new(profiles),
        Arc::new(engines),
        Arc::new(inspection),
    );

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), composer.clone()));

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

    info!("Server shutting down...");
    composer.shutdown();

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
}
