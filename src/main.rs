//! CR2 Streamer - a preview and RAW render server for Canon CR2 photographs.
//!
//! This binary starts the HTTP server and wires up all components.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cr2_streamer::{
    config::Config,
    photo::{DirectorySource, PhotoRegistry},
    render::RenderService,
    server::{create_router, RouterConfig},
};

#[tokio::main]
async fn main() {
    // Parse configuration from CLI and environment
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("Starting CR2 Streamer");
    info!("  Photo directory: {}", config.photo_dir.display());
    info!(
        "  Cache: {} photos, {} renders",
        config.cache_photos, config.cache_renders
    );
    info!("  JPEG quality: {}", config.jpeg_quality);

    // Create the photo source and registry
    let source = DirectorySource::new(config.photo_dir.clone());
    let registry = PhotoRegistry::with_capacity(source, config.cache_photos);

    // Create the render service
    let render = RenderService::with_settings(registry, config.cache_renders, config.jpeg_quality);

    // Build router configuration
    let router_config = build_router_config(&config);

    // Create router
    let router = create_router(render, router_config);

    // Bind and serve
    let addr = config.bind_address();
    info!("Listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "cr2_streamer=debug,tower_http=debug"
    } else {
        "cr2_streamer=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_cache_max_age(config.cache_max_age)
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}
