//! License gate
//!
//! Decides whether a requester may use a stored image. Business accounts
//! require a commercially licensed image; everyone else only needs the
//! image to exist.

use serde::Serialize;
use std::fmt;

use crate::models::{ImageRecord, UserIdentity};

/// Why a license check came back negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectionReason {
    UserNotFound,
    ImageNotFound,
    CommercialUseNotAllowed,
    /// A store lookup failed while validating
    ValidationError,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::UserNotFound => "User not found",
            RejectionReason::ImageNotFound => "Image not found in database",
            RejectionReason::CommercialUseNotAllowed => "Commercial use not allowed for this image",
            RejectionReason::ValidationError => "Validation error",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a license check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub allowed: bool,
    #[serde(serialize_with = "serialize_reason", skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectionReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
}

fn serialize_reason<S>(reason: &Option<RejectionReason>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match reason {
        Some(reason) => serializer.serialize_str(reason.as_str()),
        None => serializer.serialize_none(),
    }
}

impl ValidationResult {
    pub fn allowed(image: ImageRecord) -> Self {
        let attribution = image.metadata.attribution_text.clone();
        Self {
            allowed: true,
            reason: None,
            image: Some(image),
            attribution: Some(attribution),
        }
    }

    pub fn rejected(reason: RejectionReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            image: None,
            attribution: None,
        }
    }

    fn rejected_with_image(reason: RejectionReason, image: ImageRecord) -> Self {
        Self {
            image: Some(image),
            ..Self::rejected(reason)
        }
    }
}

/// Evaluate the license rule once the user has been found.
///
/// A missing user is handled by the caller before the image lookup.
pub fn evaluate(user: &UserIdentity, image: Option<ImageRecord>) -> ValidationResult {
    let Some(image) = image else {
        return ValidationResult::rejected(RejectionReason::ImageNotFound);
    };

    if user.is_business && !image.metadata.commercial_allowed {
        return ValidationResult::rejected_with_image(RejectionReason::CommercialUseNotAllowed, image);
    }

    ValidationResult::allowed(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;

    fn image(commercial_allowed: bool) -> ImageRecord {
        ImageRecord::from_metadata(
            fixtures::metadata("https://www.instagram.com/p/abc/", commercial_allowed),
            1,
        )
    }

    #[test]
    fn test_business_user_non_commercial_image_rejected() {
        let result = evaluate(&fixtures::user("u1", true), Some(image(false)));

        assert!(!result.allowed);
        assert_eq!(result.reason, Some(RejectionReason::CommercialUseNotAllowed));
        assert!(result.image.is_some());
        assert!(result.attribution.is_none());
    }

    #[test]
    fn test_personal_user_non_commercial_image_allowed() {
        let result = evaluate(&fixtures::user("u1", false), Some(image(false)));

        assert!(result.allowed);
        assert_eq!(
            result.attribution.as_deref(),
            Some("Photo by tester on Instagram")
        );
    }

    #[test]
    fn test_business_user_commercial_image_allowed() {
        let result = evaluate(&fixtures::user("u1", true), Some(image(true)));
        assert!(result.allowed);
    }

    #[test]
    fn test_missing_image() {
        let result = evaluate(&fixtures::user("u1", false), None);
        assert_eq!(result.reason, Some(RejectionReason::ImageNotFound));
        assert!(result.image.is_none());
    }

    #[test]
    fn test_reason_serializes_as_message() {
        let json = serde_json::to_value(ValidationResult::rejected(RejectionReason::UserNotFound))
            .unwrap();
        assert_eq!(json["allowed"], false);
        assert_eq!(json["reason"], "User not found");
        assert!(json.get("image").is_none());
        assert_eq!(RejectionReason::ValidationError.to_string(), "Validation error");
    }
}
