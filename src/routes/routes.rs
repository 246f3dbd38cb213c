//! Defines routes for the photo API.
//!
//! ## Structure
//! - **Photo endpoints**
//!   - `POST /photo`            - multipart upload (`file`, `author`)
//!   - `GET  /photos`           - list stored keys
//!   - `POST /edit-photo/{id}`  - apply filters to a stored photo
//!
//! - **Health**
//!   - `GET /healthz`, `GET /readyz`

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        photo_handlers::{edit_photo, list_photos, upload_photo},
    },
    services::photo_service::PhotoService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the router for all photo routes.
///
/// The router carries shared state (`PhotoService`) to all handlers.
pub fn routes() -> Router<PhotoService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/photo", post(upload_photo))
        .route("/photos", get(list_photos))
        .route("/edit-photo/{id}", post(edit_photo))
}

/// Routes plus the cross-cutting layers, bound to `service`.
pub fn app(service: PhotoService, max_upload_bytes: usize) -> Router {
    routes()
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
