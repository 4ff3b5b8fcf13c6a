//! # Metadata Store
//!
//! Cache-fronted access to the image, user and canvas repositories.
//!
//! ## Cache keys
//!
//! - `image_{url}` holds the record returned for a URL lookup
//! - `recent_images_{limit}_{offset}` holds one page of the recent listing
//!
//! A `save` caches the new record under its URL and drops every cached
//! recent page. Records are never updated after creation, so cached image
//! entries only go away through expiry or an explicit clear.

use bridge_traits::time::{Clock, SystemClock};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheStats, TtlCache};
use crate::error::{LibraryError, Result};
use crate::license::{self, RejectionReason, ValidationResult};
use crate::models::{
    CanvasEmbed, ImageMetadata, ImageRecord, NewCanvasEmbed, NewUser, UserIdentity,
};
use crate::repositories::{PageRequest, Repositories};

const IMAGE_KEY_PREFIX: &str = "image_";
const RECENT_KEY_PREFIX: &str = "recent_images_";

#[derive(Debug, Clone)]
enum CachedValue {
    Image(ImageRecord),
    Recent(Vec<ImageRecord>),
}

fn image_key(url: &str) -> String {
    format!("{}{}", IMAGE_KEY_PREFIX, url)
}

fn recent_key(page: PageRequest) -> String {
    format!("{}{}_{}", RECENT_KEY_PREFIX, page.limit, page.offset)
}

/// Cache-fronted metadata store over a chosen repository backend.
pub struct MetadataStore {
    repos: Repositories,
    cache: Arc<TtlCache<String, CachedValue>>,
    clock: Arc<dyn Clock>,
}

impl MetadataStore {
    pub fn new(repos: Repositories, ttl: Duration, max_entries: usize) -> Self {
        Self::with_clock(repos, ttl, max_entries, Arc::new(SystemClock))
    }

    pub fn with_clock(
        repos: Repositories,
        ttl: Duration,
        max_entries: usize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repos,
            cache: Arc::new(TtlCache::with_clock(ttl, max_entries, Arc::clone(&clock))),
            clock,
        }
    }

    // =========================================================================
    // Images
    // =========================================================================

    /// Record for `url`, served from cache within the TTL.
    #[instrument(skip(self))]
    pub async fn get_by_url(&self, url: &str) -> Result<Option<ImageRecord>> {
        let key = image_key(url);
        if let Some(CachedValue::Image(record)) = self.cache.get(&key).await {
            debug!(url, "Image cache hit");
            return Ok(Some(record));
        }

        let record = self.repos.images.find_by_url(url).await.map_err(|e| {
            warn!(url, error = %e, "Image lookup failed");
            e
        })?;

        if let Some(record) = &record {
            self.cache
                .set(key, CachedValue::Image(record.clone()))
                .await;
        }

        Ok(record)
    }

    /// Persist freshly fetched metadata as a new record.
    ///
    /// A URL that already has a record is a `Conflict`.
    #[instrument(skip(self, metadata), fields(url = %metadata.original_url))]
    pub async fn save(&self, metadata: ImageMetadata) -> Result<ImageRecord> {
        let record = ImageRecord::from_metadata(metadata, self.clock.unix_timestamp_millis());

        self.repos.images.insert(&record).await.map_err(|e| {
            warn!(error = %e, "Failed to save image metadata");
            e
        })?;

        self.cache
            .set(
                image_key(record.original_url()),
                CachedValue::Image(record.clone()),
            )
            .await;
        let dropped = self
            .cache
            .remove_matching(|key| key.starts_with(RECENT_KEY_PREFIX))
            .await;

        info!(id = %record.id, dropped_pages = dropped, "Image metadata saved");
        Ok(record)
    }

    /// Newest records first.
    pub async fn recent_images(&self, page: PageRequest) -> Result<Vec<ImageRecord>> {
        let key = recent_key(page);
        if let Some(CachedValue::Recent(records)) = self.cache.get(&key).await {
            return Ok(records);
        }

        let records = self.repos.images.list_recent(page).await.map_err(|e| {
            warn!(error = %e, "Recent image listing failed");
            e
        })?;

        self.cache
            .set(key, CachedValue::Recent(records.clone()))
            .await;
        Ok(records)
    }

    // =========================================================================
    // Users and canvases
    // =========================================================================

    pub async fn get_user(&self, id: &str) -> Result<Option<UserIdentity>> {
        self.repos.users.find_by_id(id).await
    }

    /// Create a user with a unique, non-empty username.
    #[instrument(skip(self, new_user), fields(username = %new_user.username))]
    pub async fn create_user(&self, new_user: NewUser) -> Result<UserIdentity> {
        new_user
            .validate()
            .map_err(|message| LibraryError::InvalidInput {
                field: "username".to_string(),
                message,
            })?;

        let user = new_user.into_identity(self.clock.unix_timestamp_millis());
        self.repos.users.insert(&user).await?;

        info!(user_id = %user.id, "User created");
        Ok(user)
    }

    /// Place an existing image on a canvas owned by an existing user.
    #[instrument(skip(self, embed), fields(canvas_id = %embed.canvas_id))]
    pub async fn save_canvas_embed(&self, embed: NewCanvasEmbed) -> Result<CanvasEmbed> {
        embed
            .validate()
            .map_err(|message| LibraryError::InvalidInput {
                field: "CanvasEmbed".to_string(),
                message,
            })?;

        if self.repos.users.find_by_id(&embed.user_id).await?.is_none() {
            return Err(LibraryError::NotFound {
                entity_type: "User".to_string(),
                id: embed.user_id,
            });
        }

        if self.repos.images.find_by_id(&embed.image_id).await?.is_none() {
            return Err(LibraryError::NotFound {
                entity_type: "Image".to_string(),
                id: embed.image_id,
            });
        }

        let embed = embed.into_embed(self.clock.unix_timestamp_millis());
        self.repos.canvas.insert(&embed).await?;

        debug!(embed_id = %embed.id, "Canvas embed saved");
        Ok(embed)
    }

    // =========================================================================
    // License gate
    // =========================================================================

    /// Check whether `user_id` may use the image stored for `url`.
    ///
    /// Never fails: store errors become a `Validation error` rejection.
    #[instrument(skip(self))]
    pub async fn validate_license(&self, user_id: &str, url: &str) -> ValidationResult {
        let user = match self.get_user(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return ValidationResult::rejected(RejectionReason::UserNotFound),
            Err(e) => {
                warn!(error = %e, "User lookup failed during license validation");
                return ValidationResult::rejected(RejectionReason::ValidationError);
            }
        };

        match self.get_by_url(url).await {
            Ok(image) => license::evaluate(&user, image),
            Err(e) => {
                warn!(error = %e, "Image lookup failed during license validation");
                ValidationResult::rejected(RejectionReason::ValidationError)
            }
        }
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Ping the backing store.
    pub async fn test_connection(&self) -> bool {
        match self.repos.images.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Store connection test failed");
                false
            }
        }
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        info!("Store cache cleared");
    }

    /// Periodically drop expired cache entries until `shutdown` fires.
    pub fn spawn_sweeper(&self, interval: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        self.cache.spawn_sweeper(interval, shutdown)
    }
}
