//! Metadata Strategies
//!
//! Ways of obtaining metadata for a post, tried in order by the fetcher:
//! - [`AuthenticatedOEmbed`] - Graph API oEmbed with an access token
//! - [`PublicOEmbed`] - the same endpoint without a token
//! - [`PageScrape`] - meta tags from the post page, enriched by public oEmbed
//!
//! Each strategy wraps its HTTP calls in [`crate::retry::retry_request`].

pub mod oembed;
pub mod scrape;

use async_trait::async_trait;
use core_library::models::ImageMetadata;

use crate::error::Result;

pub use oembed::{AuthenticatedOEmbed, OEmbedClient, PublicOEmbed};
pub use scrape::PageScrape;

/// One way of producing metadata for a post URL.
#[async_trait]
pub trait MetadataStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn fetch(&self, url: &str) -> Result<ImageMetadata>;
}
