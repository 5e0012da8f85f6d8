//! HTTP request handlers for the CR2 photo API.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /photos` - List servable photos
//! - `GET /photos/{photo_id}` - Photo metadata
//! - `GET /photos/{photo_id}/{output}` - One of the four decoded outputs

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::{PhotoError, ServeError};
use crate::photo::PhotoSource;
use crate::render::{OutputKind, RenderService};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state passed to all handlers.
pub struct AppState<S: PhotoSource> {
    /// The render service producing encoded outputs.
    pub render: Arc<RenderService<S>>,

    /// Cache-Control max-age in seconds for image responses.
    pub cache_max_age: u32,
}

impl<S: PhotoSource + 'static> AppState<S> {
    /// Create application state with the default cache max-age (1 hour).
    pub fn new(render: RenderService<S>) -> Self {
        Self {
            render: Arc::new(render),
            cache_max_age: 3600,
        }
    }

    /// Create application state with a custom cache max-age.
    pub fn with_cache_max_age(render: RenderService<S>, cache_max_age: u32) -> Self {
        Self {
            render: Arc::new(render),
            cache_max_age,
        }
    }
}

impl<S: PhotoSource> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            render: Arc::clone(&self.render),
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g. "not_found", "unsupported_photo").
    pub error: String,

    /// Human-readable error message.
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Response from the photo list endpoint.
#[derive(Debug, Serialize)]
pub struct PhotosResponse {
    pub photos: Vec<String>,
}

/// Metadata for a single output.
#[derive(Debug, Serialize)]
pub struct OutputMetadataResponse {
    /// Output key (0..3).
    pub output: u8,

    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,

    /// Media type the output is served as.
    pub media_type: String,
}

/// Response from the photo metadata endpoint.
#[derive(Debug, Serialize)]
pub struct PhotoMetadataResponse {
    /// Photo identifier.
    pub photo_id: String,

    /// Camera manufacturer, when the file records one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_make: Option<String>,

    /// Camera model, when the file records one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_model: Option<String>,

    /// RAW slice geometry: slice count, slice width, last slice width.
    pub slices: [u16; 3],

    /// Metadata for the four outputs.
    pub outputs: Vec<OutputMetadataResponse>,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert ServeError to an HTTP response.
///
/// Client-side failures log at WARN, server-side failures at ERROR.
impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ServeError::Photo(PhotoError::NotFound { photo_id }) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Photo not found: {}", photo_id),
            ),

            ServeError::Photo(PhotoError::InvalidId { photo_id }) => (
                StatusCode::BAD_REQUEST,
                "invalid_photo_id",
                format!("Invalid photo id: {}", photo_id),
            ),

            ServeError::Photo(PhotoError::Unsupported { message }) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_photo",
                message.clone(),
            ),

            ServeError::Photo(PhotoError::Decode { message }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "decode_error",
                message.clone(),
            ),

            ServeError::InvalidOutput { output } => (
                StatusCode::BAD_REQUEST,
                "invalid_output",
                format!("Invalid output index: {} (expected 0-3)", output),
            ),

            ServeError::Encode { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "encode_error",
                message.clone(),
            ),
        };

        if status.is_server_error() {
            error!(%status, "{}", message);
        } else {
            warn!(%status, "{}", message);
        }

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });
        (status, body).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /photos` — list servable photos.
pub async fn photos_handler<S: PhotoSource + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<PhotosResponse>, ServeError> {
    let photos = state.render.list_photos().await?;
    Ok(Json(PhotosResponse { photos }))
}

/// `GET /photos/{photo_id}` — photo metadata.
pub async fn photo_metadata_handler<S: PhotoSource + 'static>(
    State(state): State<AppState<S>>,
    Path(photo_id): Path<String>,
) -> Result<Json<PhotoMetadataResponse>, ServeError> {
    let photo = state.render.photo(&photo_id).await?;

    let dimensions = [
        (photo.large_preview.width(), photo.large_preview.height()),
        (photo.thumbnail.width(), photo.thumbnail.height()),
        (photo.rgb_preview.width(), photo.rgb_preview.height()),
        (photo.raw_render.width(), photo.raw_render.height()),
    ];

    let outputs = OutputKind::ALL
        .iter()
        .map(|&output| {
            let (width, height) = dimensions[output.key() as usize];
            OutputMetadataResponse {
                output: output.key(),
                width,
                height,
                media_type: output.media_type().to_string(),
            }
        })
        .collect();

    Ok(Json(PhotoMetadataResponse {
        photo_id,
        camera_make: photo.camera_make().map(str::to_owned),
        camera_model: photo.camera_model().map(str::to_owned),
        slices: [photo.slices.count, photo.slices.width, photo.slices.last_width],
        outputs,
    }))
}

/// `GET /photos/{photo_id}/{output}` — serve one decoded output.
pub async fn output_handler<S: PhotoSource + 'static>(
    State(state): State<AppState<S>>,
    Path((photo_id, output)): Path<(String, String)>,
) -> Result<Response, ServeError> {
    let output = OutputKind::from_key(&output).ok_or(ServeError::InvalidOutput { output })?;

    let rendered = state.render.render(&photo_id, output).await?;
    debug!(
        photo_id = %photo_id,
        output = output.key(),
        bytes = rendered.data.len(),
        cache_hit = rendered.cache_hit,
        "serving output"
    );

    let headers = [
        (header::CONTENT_TYPE, rendered.media_type.to_string()),
        (
            header::CACHE_CONTROL,
            format!("public, max-age={}", state.cache_max_age),
        ),
        (
            header::HeaderName::from_static("x-cache"),
            if rendered.cache_hit { "hit" } else { "miss" }.to_string(),
        ),
    ];

    Ok((StatusCode::OK, headers, rendered.data).into_response())
}
