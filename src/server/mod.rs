//! HTTP presentation layer.

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, output_handler, photo_metadata_handler, photos_handler, AppState,
    ErrorResponse, HealthResponse, OutputMetadataResponse, PhotoMetadataResponse, PhotosResponse,
};
pub use routes::{create_router, RouterConfig};
