//! Domain models for the gallery
//!
//! Image records, requester identities and canvas placements, with
//! validation. Timestamps are Unix milliseconds.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a store-side identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Images
// =============================================================================

/// Provider-produced description of one externally hosted image.
///
/// Becomes an [`ImageRecord`] once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub source_provider: String,
    /// Identity of the record: the post URL the metadata was fetched for
    pub original_url: String,
    pub embed_html: String,
    pub license_type: String,
    pub license_url: String,
    pub commercial_allowed: bool,
    pub attribution_text: String,
    pub provider_attribution_required: bool,
    pub author_name: String,
    pub author_url: String,
    pub image_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
}

impl ImageMetadata {
    pub fn validate(&self) -> Result<(), String> {
        if self.original_url.trim().is_empty() {
            return Err("Original URL cannot be empty".to_string());
        }

        if self.source_provider.trim().is_empty() {
            return Err("Source provider cannot be empty".to_string());
        }

        if self.license_type.trim().is_empty() {
            return Err("License type cannot be empty".to_string());
        }

        Ok(())
    }
}

/// Persisted image metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    #[serde(flatten)]
    pub metadata: ImageMetadata,
    pub fetched_at: i64,
    pub last_checked_at: i64,
}

impl ImageRecord {
    /// Assign identity and timestamps to freshly fetched metadata.
    pub fn from_metadata(metadata: ImageMetadata, now_millis: i64) -> Self {
        Self {
            id: new_id(),
            metadata,
            fetched_at: now_millis,
            last_checked_at: now_millis,
        }
    }

    pub fn original_url(&self) -> &str {
        &self.metadata.original_url
    }
}

// =============================================================================
// Users
// =============================================================================

/// A requester. Ids are opaque and may be client generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub username: String,
    /// Business accounts may only use commercially licensed images
    pub is_business: bool,
    pub created_at: i64,
}

/// Input for creating a [`UserIdentity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub is_business: bool,
}

impl NewUser {
    pub fn new(username: impl Into<String>, is_business: bool) -> Self {
        Self {
            username: username.into(),
            is_business,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err("Username cannot be empty".to_string());
        }

        if username.chars().count() > 64 {
            return Err("Username cannot exceed 64 characters".to_string());
        }

        Ok(())
    }

    pub fn into_identity(self, now_millis: i64) -> UserIdentity {
        UserIdentity {
            id: new_id(),
            username: self.username.trim().to_string(),
            is_business: self.is_business,
            created_at: now_millis,
        }
    }
}

// =============================================================================
// Canvas embeds
// =============================================================================

/// Placement of an embed on a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EmbedPosition {
    pub x: f64,
    pub y: f64,
}

/// An image placed on a user's canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasEmbed {
    pub id: String,
    pub canvas_id: String,
    pub image_id: String,
    pub owner_user_id: String,
    pub embed_position: EmbedPosition,
    pub note: String,
    pub inserted_at: i64,
}

/// Input for creating a [`CanvasEmbed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCanvasEmbed {
    pub canvas_id: String,
    pub image_id: String,
    pub user_id: String,
    #[serde(default)]
    pub position: Option<EmbedPosition>,
    #[serde(default)]
    pub note: Option<String>,
}

impl NewCanvasEmbed {
    pub fn validate(&self) -> Result<(), String> {
        if self.canvas_id.trim().is_empty() {
            return Err("Canvas id cannot be empty".to_string());
        }

        if self.image_id.trim().is_empty() {
            return Err("Image id cannot be empty".to_string());
        }

        if self.user_id.trim().is_empty() {
            return Err("User id cannot be empty".to_string());
        }

        if let Some(position) = self.position {
            if !position.x.is_finite() || !position.y.is_finite() {
                return Err("Embed position must be finite".to_string());
            }
        }

        Ok(())
    }

    pub fn into_embed(self, now_millis: i64) -> CanvasEmbed {
        CanvasEmbed {
            id: new_id(),
            canvas_id: self.canvas_id,
            image_id: self.image_id,
            owner_user_id: self.user_id,
            embed_position: self.position.unwrap_or_default(),
            note: self.note.unwrap_or_default(),
            inserted_at: now_millis,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn metadata(url: &str, commercial_allowed: bool) -> ImageMetadata {
        ImageMetadata {
            source_provider: "instagram".to_string(),
            original_url: url.to_string(),
            embed_html: String::new(),
            license_type: "instagram".to_string(),
            license_url: "https://help.instagram.com/581066165581870".to_string(),
            commercial_allowed,
            attribution_text: "Photo by tester on Instagram".to_string(),
            provider_attribution_required: true,
            author_name: "tester".to_string(),
            author_url: String::new(),
            image_url: "https://cdn.example.com/a.jpg".to_string(),
            thumbnail_url: "https://cdn.example.com/a.jpg".to_string(),
            title: "A post".to_string(),
            description: "A post".to_string(),
        }
    }

    pub fn user(id: &str, is_business: bool) -> UserIdentity {
        UserIdentity {
            id: id.to_string(),
            username: format!("user-{}", id),
            is_business,
            created_at: 1_700_000_000_000,
        }
    }
}
