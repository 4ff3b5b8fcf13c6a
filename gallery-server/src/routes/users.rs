//! User creation and license check routes.

use axum::extract::State;
use axum::Json;
use core_library::models::NewUser;
use serde::Deserialize;
use serde_json::{json, Value};

use super::present;
use crate::error::AppError;
use crate::AppContext;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: Option<String>,
    #[serde(default)]
    pub is_business: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateLicenseRequest {
    pub user_id: Option<String>,
    pub image_url: Option<String>,
}

/// POST /api/users/create
pub async fn create_user(
    State(ctx): State<AppContext>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<Value>, AppError> {
    let Some(username) = present(payload.username) else {
        return Err(AppError::bad_request("Username is required"));
    };

    let user = ctx
        .service
        .create_user(NewUser::new(username, payload.is_business))
        .await
        .map_err(AppError::core("Failed to create user"))?;

    Ok(Json(json!({ "success": true, "user": user })))
}

/// POST /api/license/validate
///
/// Always answers 200; a rejection is reported inside `validation`.
pub async fn validate_license(
    State(ctx): State<AppContext>,
    Json(payload): Json<ValidateLicenseRequest>,
) -> Result<Json<Value>, AppError> {
    let (Some(user_id), Some(image_url)) =
        (present(payload.user_id), present(payload.image_url))
    else {
        return Err(AppError::bad_request("userId and imageUrl are required"));
    };

    let validation = ctx.service.validate_license(&user_id, &image_url).await;

    Ok(Json(json!({ "success": true, "validation": validation })))
}
