//! # Metadata Fetcher
//!
//! Resolves a post URL to [`ImageMetadata`] through an ordered fallback
//! chain, fronted by its own TTL cache.
//!
//! ## Workflow
//!
//! 1. Cache lookup by URL, repeated under a per-URL lock on a miss
//! 2. Each strategy in order until one succeeds
//! 3. The static default record if all of them fail
//! 4. Whatever was produced is cached before returning
//!
//! Only a malformed URL (empty, not `http`/`https`, or no host) makes
//! [`MetadataFetcher::fetch_metadata`] fail.

use bridge_traits::http::HttpClient;
use core_library::cache::{CacheStats, TtlCache};
use core_library::KeyedLock;
use core_library::models::ImageMetadata;
use core_runtime::config::{CacheConfig, InstagramConfig, RetryConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::{MetadataError, Result};
use crate::instagram;
use crate::providers::{AuthenticatedOEmbed, MetadataStrategy, OEmbedClient, PageScrape, PublicOEmbed};
use crate::retry::RetryPolicy;

pub struct MetadataFetcher {
    strategies: Vec<Arc<dyn MetadataStrategy>>,
    cache: Arc<TtlCache<String, ImageMetadata>>,
    in_flight: KeyedLock,
}

impl MetadataFetcher {
    /// Fetcher with the standard Instagram chain: authenticated oEmbed,
    /// public oEmbed, then page scrape.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        instagram: &InstagramConfig,
        retry: &RetryConfig,
        cache: &CacheConfig,
    ) -> Self {
        let retry = RetryPolicy::from(retry);
        let oembed = Arc::new(OEmbedClient::from_config(
            Arc::clone(&http_client),
            instagram,
            retry,
        ));

        let strategies: Vec<Arc<dyn MetadataStrategy>> = vec![
            Arc::new(AuthenticatedOEmbed::new(
                Arc::clone(&oembed),
                instagram.access_token.clone(),
            )),
            Arc::new(PublicOEmbed::new(Arc::clone(&oembed))),
            Arc::new(PageScrape::new(http_client, oembed, instagram, retry)),
        ];

        Self::with_strategies(
            strategies,
            TtlCache::new(cache.fetcher_ttl, cache.fetcher_max_entries),
        )
    }

    pub fn with_strategies(
        strategies: Vec<Arc<dyn MetadataStrategy>>,
        cache: TtlCache<String, ImageMetadata>,
    ) -> Self {
        Self {
            strategies,
            cache: Arc::new(cache),
            in_flight: KeyedLock::new(),
        }
    }

    /// Metadata for `url`. Never fails for a well-formed URL.
    #[instrument(skip(self))]
    pub async fn fetch_metadata(&self, url: &str) -> Result<ImageMetadata> {
        if !instagram::is_well_formed_url(url) {
            return Err(MetadataError::InvalidUrl(url.to_string()));
        }

        if let Some(cached) = self.cache.get(url).await {
            debug!("Using cached metadata");
            return Ok(cached);
        }

        let _flight = self.in_flight.lock(url).await;
        if let Some(cached) = self.cache.get(url).await {
            debug!("Metadata cached by a concurrent fetch");
            return Ok(cached);
        }

        let metadata = self.run_chain(url).await;
        self.cache.set(url.to_string(), metadata.clone()).await;
        Ok(metadata)
    }

    async fn run_chain(&self, url: &str) -> ImageMetadata {
        for strategy in &self.strategies {
            match strategy.fetch(url).await {
                Ok(metadata) => {
                    info!(strategy = strategy.name(), "Fetched post metadata");
                    return metadata;
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "Metadata strategy failed");
                }
            }
        }

        warn!("All metadata strategies failed, using default record");
        instagram::default_metadata(url)
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        info!("Fetcher cache cleared");
    }

    /// Drop expired entries now. Returns how many were removed.
    pub async fn cleanup_cache(&self) -> usize {
        self.cache.cleanup().await
    }

    pub fn spawn_sweeper(&self, interval: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        self.cache.spawn_sweeper(interval, shutdown)
    }
}
