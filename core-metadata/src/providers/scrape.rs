//! Post page scraping
//!
//! Fetches the raw post page with a browser User-Agent and reads its meta
//! tags, then makes a best-effort public oEmbed call to enrich the result.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use core_library::models::ImageMetadata;
use core_runtime::config::InstagramConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{MetadataError, Result};
use crate::instagram;
use crate::providers::{MetadataStrategy, OEmbedClient};
use crate::retry::{retry_request, RetryPolicy};

pub struct PageScrape {
    http_client: Arc<dyn HttpClient>,
    oembed: Arc<OEmbedClient>,
    user_agent: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl PageScrape {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        oembed: Arc<OEmbedClient>,
        config: &InstagramConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            http_client,
            oembed,
            user_agent: config.scrape_user_agent.clone(),
            timeout: config.scrape_timeout,
            retry,
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let request = HttpRequest::get(url)
            .user_agent(self.user_agent.as_str())
            .header("Accept", "text/html")
            .timeout(self.timeout);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| MetadataError::NetworkError(format!("Page request failed: {}", e)))?;

        if !response.is_success() {
            return Err(MetadataError::HttpError {
                status: response.status,
                body: String::new(),
            });
        }

        Ok(String::from_utf8_lossy(&response.body).into_owned())
    }
}

#[async_trait]
impl MetadataStrategy for PageScrape {
    fn name(&self) -> &'static str {
        "page_scrape"
    }

    async fn fetch(&self, url: &str) -> Result<ImageMetadata> {
        let html = retry_request(self.retry, "instagram_page", || self.fetch_page(url)).await?;
        let page = instagram::parse_page_meta(&html);

        let oembed = match self.oembed.fetch(url, None).await {
            Ok(oembed) => Some(oembed),
            Err(e) => {
                debug!(url, error = %e, "oEmbed enrichment failed, using page data");
                None
            }
        };

        Ok(instagram::from_page(url, page, oembed))
    }
}
