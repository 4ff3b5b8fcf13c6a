//! Axum router construction.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes;
use crate::AppContext;

/// Build the complete application router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Images
        .route("/images/fetch", post(routes::images::fetch_image))
        .route("/images/batch-fetch", post(routes::images::batch_fetch))
        .route("/gallery/images", get(routes::images::list_gallery))
        // Users and licensing
        .route("/users/create", post(routes::users::create_user))
        .route("/license/validate", post(routes::users::validate_license))
        // Canvas
        .route("/canvas/embed", post(routes::canvas::embed_image))
        // Operations
        .route("/health", get(routes::system::health))
        .route("/cache/stats", get(routes::system::cache_stats))
        .route("/cache/clear", post(routes::system::clear_cache));

    Router::new()
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
