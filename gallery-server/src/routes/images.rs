//! Image fetch, batch fetch and gallery listing routes.

use axum::extract::{Query, State};
use axum::Json;
use core_library::models::ImageRecord;
use core_library::repositories::PageRequest;
use core_service::BatchFailure;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::present;
use crate::error::AppError;
use crate::AppContext;

/// Public projection of a stored image.
#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub id: String,
    pub original_url: String,
    pub embed_html: String,
    pub attribution_text: String,
    pub author_name: String,
    pub author_url: String,
    pub image_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub license_type: String,
    pub commercial_allowed: bool,
}

impl From<ImageRecord> for ImageResponse {
    fn from(record: ImageRecord) -> Self {
        let m = record.metadata;
        Self {
            id: record.id,
            original_url: m.original_url,
            embed_html: m.embed_html,
            attribution_text: m.attribution_text,
            author_name: m.author_name,
            author_url: m.author_url,
            image_url: m.image_url,
            thumbnail_url: m.thumbnail_url,
            title: m.title,
            description: m.description,
            license_type: m.license_type,
            commercial_allowed: m.commercial_allowed,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest {
    pub url: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFetchRequest {
    pub urls: Option<Vec<String>>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchFetchResponse {
    pub success: bool,
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub images: Vec<ImageResponse>,
    pub errors: Vec<BatchFailure>,
}

#[derive(Debug, Deserialize)]
pub struct GalleryQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// POST /api/images/fetch
pub async fn fetch_image(
    State(ctx): State<AppContext>,
    Json(payload): Json<FetchRequest>,
) -> Result<Json<Value>, AppError> {
    let (Some(url), Some(user_id)) = (present(payload.url), present(payload.user_id)) else {
        return Err(AppError::bad_request("URL and userId are required"));
    };

    let record = ctx
        .service
        .fetch_image(&url, &user_id)
        .await
        .map_err(AppError::core("Failed to fetch image metadata"))?;

    Ok(Json(json!({
        "success": true,
        "image": ImageResponse::from(record),
    })))
}

/// POST /api/images/batch-fetch
pub async fn batch_fetch(
    State(ctx): State<AppContext>,
    Json(payload): Json<BatchFetchRequest>,
) -> Result<Json<BatchFetchResponse>, AppError> {
    let urls = match payload.urls {
        Some(urls) if !urls.is_empty() => urls,
        _ => return Err(AppError::bad_request("URLs array is required")),
    };
    let Some(user_id) = present(payload.user_id) else {
        return Err(AppError::bad_request("userId is required"));
    };

    let report = ctx.service.batch_fetch(&urls, &user_id).await;

    Ok(Json(BatchFetchResponse {
        success: true,
        processed: report.processed,
        successful: report.successful.len(),
        failed: report.failed.len(),
        images: report.successful.into_iter().map(ImageResponse::from).collect(),
        errors: report.failed,
    }))
}

/// GET /api/gallery/images?limit=&offset=
pub async fn list_gallery(
    State(ctx): State<AppContext>,
    Query(query): Query<GalleryQuery>,
) -> Result<Json<Value>, AppError> {
    let defaults = PageRequest::default();
    let page = PageRequest::new(
        query.limit.unwrap_or(defaults.limit),
        query.offset.unwrap_or(defaults.offset),
    );

    let images = ctx
        .service
        .recent_images(page)
        .await
        .map_err(AppError::core("Failed to fetch gallery images"))?;

    Ok(Json(json!({
        "success": true,
        "images": images,
    })))
}
