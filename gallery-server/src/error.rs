//! Error-to-HTTP response conversion.
//!
//! Handlers return `Result<T, AppError>`; the status code and JSON body are
//! decided here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use core_library::LibraryError;
use core_metadata::MetadataError;
use core_service::CoreError;
use serde_json::json;

pub enum AppError {
    /// Required request fields were missing or empty.
    BadRequest(String),
    /// A core failure, annotated with what the handler was doing.
    Core {
        context: &'static str,
        source: CoreError,
    },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn core(context: &'static str) -> impl FnOnce(CoreError) -> Self {
        move |source| AppError::Core { context, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Core { source, .. } => match source {
                CoreError::InvalidUrl(_) | CoreError::Metadata(MetadataError::InvalidUrl(_)) => {
                    StatusCode::BAD_REQUEST
                }
                CoreError::LicenseRejected { .. } => StatusCode::FORBIDDEN,
                CoreError::Library(LibraryError::InvalidInput { .. }) => StatusCode::BAD_REQUEST,
                CoreError::Library(LibraryError::NotFound { .. }) => StatusCode::NOT_FOUND,
                CoreError::Library(LibraryError::Conflict(_)) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            AppError::BadRequest(message) => json!({ "error": message }),
            AppError::Core { source, .. } if status == StatusCode::FORBIDDEN => {
                let reason = match &source {
                    CoreError::LicenseRejected { reason } => Some(reason.as_str()),
                    _ => None,
                };
                json!({ "error": "License validation failed", "reason": reason })
            }
            AppError::Core { source, .. } if status.is_client_error() => {
                json!({ "error": source.to_string() })
            }
            AppError::Core { context, source } => {
                tracing::error!(status = %status, context, error = %source, "Server error in API handler");
                json!({ "error": context, "details": source.to_string() })
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_library::RejectionReason;

    #[test]
    fn invalid_url_produces_400() {
        let err = AppError::core("Failed to fetch image metadata")(CoreError::InvalidUrl(
            "x".into(),
        ));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn license_rejection_produces_403() {
        let err = AppError::core("Failed to fetch image metadata")(CoreError::LicenseRejected {
            reason: RejectionReason::CommercialUseNotAllowed,
        });
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn store_failure_produces_500() {
        let err = AppError::core("Failed to fetch gallery images")(CoreError::Library(
            LibraryError::Corrupt("bad row".into()),
        ));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn duplicate_username_produces_409() {
        let err = AppError::core("Failed to create user")(CoreError::Library(
            LibraryError::Conflict("Username".into()),
        ));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}
