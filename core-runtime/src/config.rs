//! # Gallery Configuration Module
//!
//! Provides configuration management for the gallery core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `GalleryConfig` holding the injected bridges and every tunable of the
//! metadata pipeline. It enforces fail-fast validation so a misconfigured
//! server refuses to start instead of misbehaving under load.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - Outbound oEmbed and page requests. Injected automatically
//!   when the `native-shims` feature is enabled.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{GalleryConfig, StoreBackend};
//!
//! let config = GalleryConfig::builder()
//!     .store(StoreBackend::Sqlite { database_url: "sqlite:gallery.db".into() })
//!     .instagram_access_token("EAAB...")
//!     .build()?;
//! ```
//!
//! ### Environment
//!
//! [`GalleryConfigBuilder::from_env`] reads `GALLERY_STORE`, `DATABASE_URL`,
//! `INSTAGRAM_ACCESS_TOKEN` and `INSTAGRAM_APP_ID` on top of the defaults.

use crate::error::{Error, Result};
use bridge_traits::HttpClient;
use std::sync::Arc;
use std::time::Duration;

/// Graph API base used for oEmbed lookups.
pub const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com/v18.0";

/// Browser User-Agent sent when scraping post pages.
pub const DEFAULT_SCRAPE_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Backing store selected at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// SQLite through sqlx, with embedded migrations.
    Sqlite { database_url: String },
    /// In-process document store. Data is lost on restart.
    Memory,
}

impl Default for StoreBackend {
    fn default() -> Self {
        StoreBackend::Sqlite {
            database_url: "sqlite:gallery.db".to_string(),
        }
    }
}

/// Instagram provider settings.
#[derive(Clone, PartialEq, Eq)]
pub struct InstagramConfig {
    /// Token for the authenticated oEmbed endpoint. When absent the
    /// authenticated strategy is skipped.
    pub access_token: Option<String>,
    pub app_id: Option<String>,
    pub graph_api_base: String,
    /// Timeout for oEmbed calls
    pub api_timeout: Duration,
    /// Timeout for raw page fetches
    pub scrape_timeout: Duration,
    pub scrape_user_agent: String,
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            app_id: None,
            graph_api_base: DEFAULT_GRAPH_API_BASE.to_string(),
            api_timeout: Duration::from_secs(10),
            scrape_timeout: Duration::from_secs(15),
            scrape_user_agent: DEFAULT_SCRAPE_USER_AGENT.to_string(),
        }
    }
}

impl std::fmt::Debug for InstagramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstagramConfig")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("app_id", &self.app_id.as_ref().map(|_| "[REDACTED]"))
            .field("graph_api_base", &self.graph_api_base)
            .field("api_timeout", &self.api_timeout)
            .field("scrape_timeout", &self.scrape_timeout)
            .finish()
    }
}

/// TTL cache settings for the store adapter and the fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub store_ttl: Duration,
    pub store_max_entries: usize,
    pub fetcher_ttl: Duration,
    pub fetcher_max_entries: usize,
    /// Period of the background expiry sweep
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            store_ttl: Duration::from_secs(10 * 60),
            store_max_entries: 1000,
            fetcher_ttl: Duration::from_secs(5 * 60),
            fetcher_max_entries: 1000,
            sweep_interval: Duration::from_secs(5 * 60),
        }
    }
}

/// Retry policy for outbound provider calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each further retry
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

/// Batch orchestration limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// URLs beyond this count are ignored
    pub max_items: usize,
    /// Pipelines run concurrently within a window
    pub window_size: usize,
    /// Pause between windows
    pub pacing_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_items: 50,
            window_size: 10,
            pacing_delay: Duration::from_millis(1000),
        }
    }
}

/// Gallery core configuration.
///
/// Use [`GalleryConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct GalleryConfig {
    pub store: StoreBackend,
    pub http_client: Arc<dyn HttpClient>,
    pub instagram: InstagramConfig,
    pub cache: CacheConfig,
    pub retry: RetryConfig,
    pub batch: BatchConfig,
}

impl std::fmt::Debug for GalleryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryConfig")
            .field("store", &self.store)
            .field("http_client", &"HttpClient { ... }")
            .field("instagram", &self.instagram)
            .field("cache", &self.cache)
            .field("retry", &self.retry)
            .field("batch", &self.batch)
            .finish()
    }
}

impl GalleryConfig {
    pub fn builder() -> GalleryConfigBuilder {
        GalleryConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if let StoreBackend::Sqlite { database_url } = &self.store {
            if database_url.trim().is_empty() {
                return Err(Error::Config("Database URL cannot be empty".to_string()));
            }
        }

        if self.cache.store_ttl.is_zero() || self.cache.fetcher_ttl.is_zero() {
            return Err(Error::Config(
                "Cache TTL must be greater than zero".to_string(),
            ));
        }

        if self.cache.store_max_entries == 0 || self.cache.fetcher_max_entries == 0 {
            return Err(Error::Config(
                "Cache size must be greater than zero entries".to_string(),
            ));
        }

        if self.cache.sweep_interval.is_zero() {
            return Err(Error::Config(
                "Cache sweep interval must be greater than zero".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(Error::Config(
                "Retry attempts must be at least 1".to_string(),
            ));
        }

        if self.retry.max_attempts > 10 {
            return Err(Error::Config(
                "Retry attempts exceed maximum of 10".to_string(),
            ));
        }

        if self.batch.window_size == 0 || self.batch.max_items == 0 {
            return Err(Error::Config(
                "Batch window size and item cap must be greater than zero".to_string(),
            ));
        }

        if self.instagram.graph_api_base.trim().is_empty() {
            return Err(Error::Config(
                "Graph API base URL cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(feature = "native-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_native::ReqwestHttpClient;

    let client = ReqwestHttpClient::new()
        .map_err(|e| Error::Internal(format!("Failed to create default HttpClient: {}", e)))?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(client)
}

#[cfg(not(feature = "native-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for metadata fetching. \
                 Enable the 'native-shims' feature to use the default reqwest client \
                 or inject one with .http_client()."
            .to_string(),
    })
}

/// Builder for constructing [`GalleryConfig`] instances.
#[derive(Default)]
pub struct GalleryConfigBuilder {
    store: Option<StoreBackend>,
    http_client: Option<Arc<dyn HttpClient>>,
    instagram: InstagramConfig,
    cache: CacheConfig,
    retry: RetryConfig,
    batch: BatchConfig,
}

impl GalleryConfigBuilder {
    /// Seed a builder from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Seed a builder from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::default();

        let store = lookup("GALLERY_STORE").unwrap_or_else(|| "sqlite".to_string());
        builder.store = Some(match store.to_ascii_lowercase().as_str() {
            "memory" => StoreBackend::Memory,
            "sqlite" => StoreBackend::Sqlite {
                database_url: lookup("DATABASE_URL")
                    .unwrap_or_else(|| "sqlite:gallery.db".to_string()),
            },
            other => {
                return Err(Error::InvalidEnv {
                    key: "GALLERY_STORE".to_string(),
                    value: other.to_string(),
                    expected: "'sqlite' or 'memory'".to_string(),
                })
            }
        });

        builder.instagram.access_token =
            lookup("INSTAGRAM_ACCESS_TOKEN").filter(|t| !t.trim().is_empty());
        builder.instagram.app_id = lookup("INSTAGRAM_APP_ID").filter(|t| !t.trim().is_empty());

        Ok(builder)
    }

    pub fn store(mut self, store: StoreBackend) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the reqwest-based default is used when the
    /// `native-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn instagram_access_token(mut self, token: impl Into<String>) -> Self {
        self.instagram.access_token = Some(token.into());
        self
    }

    pub fn graph_api_base(mut self, base: impl Into<String>) -> Self {
        self.instagram.graph_api_base = base.into();
        self
    }

    pub fn instagram(mut self, instagram: InstagramConfig) -> Self {
        self.instagram = instagram;
        self
    }

    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn batch(mut self, batch: BatchConfig) -> Self {
        self.batch = batch;
        self
    }

    /// Builds the final `GalleryConfig` instance.
    ///
    /// # Errors
    ///
    /// - `CapabilityMissing` when no `HttpClient` is available
    /// - `Config` when a value fails [`GalleryConfig::validate`]
    pub fn build(self) -> Result<GalleryConfig> {
        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let config = GalleryConfig {
            store: self.store.unwrap_or_default(),
            http_client,
            instagram: self.instagram,
            cache: self.cache,
            retry: self.retry,
            batch: self.batch,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{BridgeError, HttpRequest, HttpResponse};
    use std::collections::HashMap;

    struct NoopHttpClient;

    #[async_trait]
    impl HttpClient for NoopHttpClient {
        async fn execute(
            &self,
            _request: HttpRequest,
        ) -> std::result::Result<HttpResponse, BridgeError> {
            Err(BridgeError::NotAvailable("offline".to_string()))
        }
    }

    fn builder() -> GalleryConfigBuilder {
        GalleryConfig::builder().http_client(Arc::new(NoopHttpClient))
    }

    #[test]
    fn test_defaults() {
        let config = builder().build().unwrap();

        assert_eq!(config.store, StoreBackend::default());
        assert_eq!(config.cache.store_ttl, Duration::from_secs(600));
        assert_eq!(config.cache.fetcher_ttl, Duration::from_secs(300));
        assert_eq!(config.cache.store_max_entries, 1000);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay, Duration::from_millis(1000));
        assert_eq!(config.batch.max_items, 50);
        assert_eq!(config.batch.window_size, 10);
        assert_eq!(config.instagram.api_timeout, Duration::from_secs(10));
        assert_eq!(config.instagram.scrape_timeout, Duration::from_secs(15));
        assert!(config.instagram.access_token.is_none());
    }

    #[test]
    fn test_validation_rejects_zero_window() {
        let result = builder()
            .batch(BatchConfig {
                window_size: 0,
                ..BatchConfig::default()
            })
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validation_rejects_zero_attempts() {
        let result = builder()
            .retry(RetryConfig {
                max_attempts: 0,
                ..RetryConfig::default()
            })
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validation_rejects_zero_ttl() {
        let result = builder()
            .cache(CacheConfig {
                fetcher_ttl: Duration::ZERO,
                ..CacheConfig::default()
            })
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validation_rejects_empty_database_url() {
        let result = builder()
            .store(StoreBackend::Sqlite {
                database_url: "  ".to_string(),
            })
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_lookup_reads_environment() {
        let env: HashMap<&str, &str> = [
            ("GALLERY_STORE", "memory"),
            ("INSTAGRAM_ACCESS_TOKEN", "abc"),
            ("INSTAGRAM_APP_ID", ""),
        ]
        .into_iter()
        .collect();

        let config = GalleryConfigBuilder::from_lookup(|k| env.get(k).map(|v| v.to_string()))
            .unwrap()
            .http_client(Arc::new(NoopHttpClient))
            .build()
            .unwrap();

        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.instagram.access_token.as_deref(), Some("abc"));
        assert!(config.instagram.app_id.is_none());
    }

    #[test]
    fn test_from_lookup_rejects_unknown_store() {
        let result = GalleryConfigBuilder::from_lookup(|k| {
            (k == "GALLERY_STORE").then(|| "postgres".to_string())
        });

        assert!(matches!(result, Err(Error::InvalidEnv { .. })));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = builder().instagram_access_token("secret-token").build().unwrap();
        let rendered = format!("{:?}", config);

        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[cfg(not(feature = "native-shims"))]
    #[test]
    fn test_missing_http_client_is_capability_error() {
        let result = GalleryConfig::builder().build();
        assert!(matches!(result, Err(Error::CapabilityMissing { .. })));
    }
}
