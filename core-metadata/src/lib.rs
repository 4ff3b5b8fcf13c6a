//! # Post Metadata Module
//!
//! Resolves Instagram post URLs to image metadata.
//!
//! ## Overview
//!
//! This module handles:
//! - Post URL validation and embed markup
//! - oEmbed lookups, authenticated and public
//! - Page scraping as the last network fallback
//! - Retry with exponential backoff around every outbound call
//! - A TTL cache in front of the fallback chain

pub mod error;
pub mod fetcher;
pub mod instagram;
pub mod providers;
pub mod retry;

pub use error::{MetadataError, Result};
pub use fetcher::MetadataFetcher;
pub use instagram::{embed_script, is_valid_instagram_url};
pub use retry::{retry_request, RetryPolicy};
