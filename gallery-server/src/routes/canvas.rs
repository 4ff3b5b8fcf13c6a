use axum::extract::State;
use axum::Json;
use core_library::models::{EmbedPosition, NewCanvasEmbed};
use serde::Deserialize;
use serde_json::{json, Value};

use super::present;
use crate::error::AppError;
use crate::AppContext;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedRequest {
    pub canvas_id: Option<String>,
    pub image_id: Option<String>,
    pub user_id: Option<String>,
    pub position: Option<EmbedPosition>,
    pub note: Option<String>,
}

/// POST /api/canvas/embed
pub async fn embed_image(
    State(ctx): State<AppContext>,
    Json(payload): Json<EmbedRequest>,
) -> Result<Json<Value>, AppError> {
    let (Some(canvas_id), Some(image_id), Some(user_id)) = (
        present(payload.canvas_id),
        present(payload.image_id),
        present(payload.user_id),
    ) else {
        return Err(AppError::bad_request(
            "canvasId, imageId, and userId are required",
        ));
    };

    let embed = ctx
        .service
        .save_canvas_embed(NewCanvasEmbed {
            canvas_id,
            image_id,
            user_id,
            position: payload.position,
            note: payload.note,
        })
        .await
        .map_err(AppError::core("Failed to save canvas embed"))?;

    Ok(Json(json!({ "success": true, "embed": embed })))
}
