//! Single-item image pipeline
//!
//! URL validation → lookup or fetch → persist if new → license check.
//!
//! Lookup, fetch and persist run under a per-URL lock, so a URL repeated
//! within one batch window is fetched and saved once.

use async_trait::async_trait;
use core_library::models::ImageRecord;
use core_library::{KeyedLock, MetadataStore};
use core_metadata::{is_valid_instagram_url, MetadataFetcher};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::{CoreError, Result};

/// Turns one post URL into a licensed image record for a user.
#[async_trait]
pub trait ImagePipeline: Send + Sync {
    async fn process(&self, url: &str, user_id: &str) -> Result<ImageRecord>;
}

/// Pipeline over the metadata store and fetcher.
pub struct FetchPipeline {
    fetcher: Arc<MetadataFetcher>,
    store: Arc<MetadataStore>,
    in_flight: KeyedLock,
}

impl FetchPipeline {
    pub fn new(fetcher: Arc<MetadataFetcher>, store: Arc<MetadataStore>) -> Self {
        Self {
            fetcher,
            store,
            in_flight: KeyedLock::new(),
        }
    }

    async fn lookup_or_fetch(&self, url: &str) -> Result<ImageRecord> {
        let _flight = self.in_flight.lock(url).await;

        if let Some(record) = self.store.get_by_url(url).await? {
            return Ok(record);
        }

        debug!("No stored record, fetching metadata");
        let metadata = self.fetcher.fetch_metadata(url).await?;
        Ok(self.store.save(metadata).await?)
    }
}

#[async_trait]
impl ImagePipeline for FetchPipeline {
    #[instrument(skip(self))]
    async fn process(&self, url: &str, user_id: &str) -> Result<ImageRecord> {
        if !is_valid_instagram_url(url) {
            return Err(CoreError::InvalidUrl(url.to_string()));
        }

        let record = self.lookup_or_fetch(url).await?;

        let validation = self.store.validate_license(user_id, url).await;
        match validation.reason {
            Some(reason) if !validation.allowed => Err(CoreError::LicenseRejected { reason }),
            _ => Ok(record),
        }
    }
}
