//! Health and cache maintenance routes.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::{timestamp, AppContext};

/// GET /api/health
pub async fn health(State(ctx): State<AppContext>) -> Json<Value> {
    let report = ctx.service.health().await;

    Json(json!({
        "status": "ok",
        "database": report.database,
        "timestamp": timestamp(),
    }))
}

/// GET /api/cache/stats
pub async fn cache_stats(State(ctx): State<AppContext>) -> Json<Value> {
    let stats = ctx.service.cache_stats().await;

    Json(json!({
        "success": true,
        "instagram": stats.instagram,
        "database": stats.database,
        "timestamp": timestamp(),
    }))
}

/// POST /api/cache/clear
pub async fn clear_cache(State(ctx): State<AppContext>) -> Json<Value> {
    ctx.service.clear_caches().await;
    tracing::info!("All caches cleared");

    Json(json!({
        "success": true,
        "message": "All caches cleared",
        "timestamp": timestamp(),
    }))
}
