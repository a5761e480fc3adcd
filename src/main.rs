//! Campus Tiles - composites building floor plans into slippy-map tiles.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_tiles::{
    config::{CheckConfig, Cli, Command, ServeConfig},
    dataset::{Dataset, SpatialIndex},
    floor::FsImageSource,
    server::{create_router, AppState, RouterConfig},
    tile::{DiskTileStore, TileCompositor, TileDispatcher, TileService, ZoomedFloorCache},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Check(config) => run_check(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    print_banner();

    info!("Configuration:");
    info!("  Data file: {}", config.data_file.display());
    info!("  Static root: {}", config.static_root.display());
    info!("  Tiles dir: {}", config.tiles_dir.display());
    info!("  Workers: {}", config.workers);
    info!("  Cache: {}", config.cache_summary());
    if config.debug {
        warn!("  Debug: ON - stored tiles are ignored and every miss is re-rendered");
    }

    let dataset = match Dataset::load(&config.data_file) {
        Ok(dataset) => Arc::new(dataset),
        Err(e) => {
            error!("Failed to load {}: {}", config.data_file.display(), e);
            return ExitCode::FAILURE;
        }
    };
    info!(
        "  Loaded {} building(s), {} floor(s)",
        dataset.len(),
        dataset.floor_count()
    );

    // Wire the pipeline: assets -> zoomed floors -> compositor -> tile service
    let source = Arc::new(FsImageSource::new(&config.static_root));
    let zoomed = ZoomedFloorCache::new(source, config.cache_zoomed);
    let index: Arc<dyn SpatialIndex> = dataset.clone();
    let compositor = match TileCompositor::new(index, zoomed) {
        Ok(compositor) => compositor,
        Err(e) => {
            error!("Failed to build compositor: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let service = TileService::with_cache_capacity(compositor, config.cache_tiles)
        .with_store(DiskTileStore::new(&config.tiles_dir))
        .with_debug(config.debug);
    let dispatcher = Arc::new(TileDispatcher::spawn(Arc::new(service), config.workers));

    let state = AppState::new(Arc::clone(&dispatcher), dataset);
    let router = create_router(state, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/api/dump", addr);
    info!("    curl -o tile.png http://{}/api/tiles/19_82654_179471_1.png", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    dispatcher.shutdown().await;

    if let Err(e) = served {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Server stopped");
    ExitCode::SUCCESS
}

/// Resolves when the process receives Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Print the startup banner.
fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("");
    info!(" ██████╗ █████╗ ███╗   ███╗██████╗ ██╗   ██╗███████╗");
    info!("██╔════╝██╔══██╗████╗ ████║██╔══██╗██║   ██║██╔════╝");
    info!("██║     ███████║██╔████╔██║██████╔╝██║   ██║███████╗");
    info!("██║     ██╔══██║██║╚██╔╝██║██╔═══╝ ██║   ██║╚════██║");
    info!("╚██████╗██║  ██║██║ ╚═╝ ██║██║     ╚██████╔╝███████║");
    info!(" ╚═════╝╚═╝  ╚═╝╚═╝     ╚═╝╚═╝      ╚═════╝ ╚══════╝");
    info!("");
    info!("                 tiles v{}", version);
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "campus_tiles=debug,tower_http=debug"
    } else {
        "campus_tiles=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new().with_cache_max_age(config.cache_max_age);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    println!("Campus Tiles Dataset Check");
    println!("══════════════════════════");
    println!();

    let dataset = match Dataset::load(&config.data_file) {
        Ok(dataset) => {
            println!("✓ Dataset: {}", config.data_file.display());
            dataset
        }
        Err(e) => {
            println!("✗ Dataset: {}", config.data_file.display());
            println!();
            println!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("  Buildings: {}", dataset.len());
    println!("  Floors: {}", dataset.floor_count());

    if config.images {
        println!();
        println!("Preparing floor images under {}...", config.static_root.display());
        println!("─────────────────────────────");

        let source = FsImageSource::new(&config.static_root);
        let mut failures = 0usize;

        for entry in dataset.floors() {
            match entry.floor.warm(&source).await {
                Ok(()) => {
                    println!("  ✓ {} / {}", entry.building.id, entry.floor.name);
                }
                Err(e) => {
                    failures += 1;
                    println!("  ✗ {} / {}: {}", entry.building.id, entry.floor.name, e);
                }
            }
        }

        if failures > 0 {
            println!();
            println!("{} of {} floor image(s) failed", failures, dataset.floor_count());
            return ExitCode::FAILURE;
        }
    }

    println!();
    println!("══════════════════════════");
    println!("✓ All checks passed!");

    ExitCode::SUCCESS
}
