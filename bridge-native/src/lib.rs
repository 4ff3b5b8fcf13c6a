//! # Native Bridge Implementations
//!
//! Default implementations of bridge traits for server and desktop hosts.
//!
//! - `HttpClient` using `reqwest` with rustls
//!
//! Relational and document store adapters live in `core-library::adapters`
//! next to the migrations they depend on.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_native::ReqwestHttpClient;
//! use std::sync::Arc;
//!
//! let http_client = Arc::new(ReqwestHttpClient::new()?);
//! let config = GalleryConfig::builder().http_client(http_client).build()?;
//! ```

mod http;

pub use http::ReqwestHttpClient;
