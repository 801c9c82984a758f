pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;

pub use error::ApiError;
pub use state::AppState;

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/imports", get(routes::list_imports).post(routes::create_import))
        .route(
            "/imports/{id}",
            put(routes::rename_import).delete(routes::delete_import),
        )
        .route("/imports/{id}/devices", get(routes::list_devices))
        .route("/imports/{id}/devices/upload", post(routes::upload_devices))
        .route("/imports/{id}/reports/{kind}", get(routes::download_report))
        .route("/devices/all", get(routes::list_all_devices))
        .route("/devices/bulk-update", post(routes::bulk_update_devices))
        .route(
            "/devices/{id}",
            put(routes::update_device).delete(routes::delete_device),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
