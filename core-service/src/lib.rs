//! Core service façade and bootstrap helpers.
//!
//! This crate wires the configured store backend, the metadata fetcher and
//! the batch orchestrator into a single [`GalleryService`] handle that route
//! handlers call into. Native hosts typically enable the `native-shims`
//! feature so the reqwest HTTP client is injected automatically.

pub mod batch;
pub mod error;
pub mod pipeline;

pub use batch::{BatchFailure, BatchOrchestrator, BatchReport};
pub use error::{CoreError, Result};
pub use pipeline::{FetchPipeline, ImagePipeline};

use std::sync::Arc;
use std::time::Duration;

use core_library::adapters::{InMemoryDocumentStore, SqliteAdapter};
use core_library::db::{create_pool, DatabaseConfig};
use core_library::models::{
    CanvasEmbed, ImageMetadata, ImageRecord, NewCanvasEmbed, NewUser, UserIdentity,
};
use core_library::repositories::{PageRequest, Repositories};
use core_library::{CacheStats, MetadataStore, ValidationResult};
use core_metadata::MetadataFetcher;
use core_runtime::config::{BatchConfig, GalleryConfig, StoreBackend};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Reachability of the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub database: ConnectionState,
}

/// Statistics for both caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheReport {
    pub instagram: CacheStats,
    pub database: CacheStats,
}

/// Primary façade exposed to route handlers.
#[derive(Clone)]
pub struct GalleryService {
    store: Arc<MetadataStore>,
    fetcher: Arc<MetadataFetcher>,
    pipeline: Arc<dyn ImagePipeline>,
    batch: Arc<BatchOrchestrator>,
    sweep_interval: Duration,
}

impl GalleryService {
    /// Build the service from a validated configuration.
    ///
    /// Opens (and migrates) the SQLite database for the relational backend.
    pub async fn bootstrap(config: GalleryConfig) -> Result<Self> {
        config.validate()?;

        let repos = match &config.store {
            StoreBackend::Sqlite { database_url } => {
                let pool = create_pool(DatabaseConfig::new(database_url.as_str())).await?;
                Repositories::sql(Arc::new(SqliteAdapter::from_pool(pool)))
            }
            StoreBackend::Memory => Repositories::document(Arc::new(InMemoryDocumentStore::new())),
        };

        let store = Arc::new(MetadataStore::new(
            repos,
            config.cache.store_ttl,
            config.cache.store_max_entries,
        ));
        let fetcher = Arc::new(MetadataFetcher::new(
            Arc::clone(&config.http_client),
            &config.instagram,
            &config.retry,
            &config.cache,
        ));

        info!(store = ?config.store, "Gallery service initialized");
        Ok(Self::from_parts(
            store,
            fetcher,
            config.batch,
            config.cache.sweep_interval,
        ))
    }

    /// Assemble the service from already constructed components.
    pub fn from_parts(
        store: Arc<MetadataStore>,
        fetcher: Arc<MetadataFetcher>,
        batch: BatchConfig,
        sweep_interval: Duration,
    ) -> Self {
        let pipeline: Arc<dyn ImagePipeline> =
            Arc::new(FetchPipeline::new(Arc::clone(&fetcher), Arc::clone(&store)));
        let batch = Arc::new(BatchOrchestrator::new(Arc::clone(&pipeline), batch));

        Self {
            store,
            fetcher,
            pipeline,
            batch,
            sweep_interval,
        }
    }

    pub async fn fetch_metadata(&self, url: &str) -> Result<ImageMetadata> {
        Ok(self.fetcher.fetch_metadata(url).await?)
    }

    pub async fn get_by_url(&self, url: &str) -> Result<Option<ImageRecord>> {
        Ok(self.store.get_by_url(url).await?)
    }

    pub async fn save(&self, metadata: ImageMetadata) -> Result<ImageRecord> {
        Ok(self.store.save(metadata).await?)
    }

    pub async fn validate_license(&self, user_id: &str, url: &str) -> ValidationResult {
        self.store.validate_license(user_id, url).await
    }

    /// Run the single-item pipeline.
    pub async fn fetch_image(&self, url: &str, user_id: &str) -> Result<ImageRecord> {
        self.pipeline.process(url, user_id).await
    }

    pub async fn batch_fetch(&self, urls: &[String], user_id: &str) -> BatchReport {
        self.batch.batch_fetch(urls, user_id).await
    }

    pub async fn recent_images(&self, page: PageRequest) -> Result<Vec<ImageRecord>> {
        Ok(self.store.recent_images(page).await?)
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<UserIdentity> {
        Ok(self.store.create_user(new_user).await?)
    }

    pub async fn save_canvas_embed(&self, embed: NewCanvasEmbed) -> Result<CanvasEmbed> {
        Ok(self.store.save_canvas_embed(embed).await?)
    }

    pub async fn health(&self) -> HealthReport {
        let database = if self.store.test_connection().await {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        };
        HealthReport { database }
    }

    pub async fn cache_stats(&self) -> CacheReport {
        CacheReport {
            instagram: self.fetcher.cache_stats().await,
            database: self.store.cache_stats().await,
        }
    }

    pub async fn clear_caches(&self) {
        self.fetcher.clear_cache().await;
        self.store.clear_cache().await;
    }

    /// Start the expiry sweepers for both caches.
    pub fn start_maintenance(&self, shutdown: &CancellationToken) -> Vec<JoinHandle<()>> {
        vec![
            self.fetcher
                .spawn_sweeper(self.sweep_interval, shutdown.child_token()),
            self.store
                .spawn_sweeper(self.sweep_interval, shutdown.child_token()),
        ]
    }
}
