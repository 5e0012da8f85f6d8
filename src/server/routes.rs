//! Router configuration.
//!
//! # Route Structure
//!
//! ```text
//! /health                        - Health check
//! /photos                        - List photos
//! /photos/{photo_id}             - Photo metadata
//! /photos/{photo_id}/{output}    - Decoded output (0..3)
//! ```

use std::time::Duration;

use axum::{routing::get, Router};
use http::header::{ACCEPT, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::photo::PhotoSource;
use crate::render::RenderService;

use super::handlers::{
    health_handler, output_handler, photo_metadata_handler, photos_handler, AppState,
};

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin).
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age in seconds for image responses.
    pub cache_max_age: u32,

    /// Whether to enable request tracing.
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a configuration with defaults: any CORS origin, 1 hour cache
    /// max-age, tracing enabled.
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            cache_max_age: 3600,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router.
pub fn create_router<S>(render: RenderService<S>, config: RouterConfig) -> Router
where
    S: PhotoSource + 'static,
{
    let state = AppState::with_cache_max_age(render, config.cache_max_age);
    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/photos", get(photos_handler::<S>))
        .route("/photos/{photo_id}", get(photo_metadata_handler::<S>))
        .route("/photos/{photo_id}/{output}", get(output_handler::<S>))
        .with_state(state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer from configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed: Vec<http::HeaderValue> =
                origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
