//! # Host Bridge Traits
//!
//! Capability traits the gallery core depends on but does not implement.
//!
//! ## Overview
//!
//! The core never talks to a network stack, a SQL driver or a document
//! database directly. Each such collaborator is reached through a trait
//! defined here so the core can be wired against production adapters
//! (`bridge-native`, `core-library::adapters`) or test doubles.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Single-attempt outbound HTTP
//! - [`DatabaseAdapter`](database::DatabaseAdapter) - Parameterized SQL
//! - [`DocumentStore`](document::DocumentStore) - Collection / where-equals documents
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is missing:
//!
//! ```ignore
//! let http_client = config.http_client
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "HttpClient".to_string(),
//!         message: "No HTTP client provided. Enable `native-shims` or inject one.".to_string(),
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! convert driver-specific errors into it with enough context to act on.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single adapter can be shared
//! across concurrently running pipelines.

pub mod database;
pub mod document;
pub mod error;
pub mod http;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use database::{DatabaseAdapter, QueryRow, QueryValue};
pub use document::{Document, DocumentStore, SortOrder};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use time::{Clock, ManualClock, SystemClock};
