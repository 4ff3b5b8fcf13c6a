//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the gallery core:
//! - Logging and tracing infrastructure
//! - Configuration management with fail-fast validation
//!
//! Every other workspace crate takes its tunables from
//! [`GalleryConfig`](config::GalleryConfig) and logs through the subscriber
//! installed by [`init_logging`](logging::init_logging).

pub mod config;
pub mod error;
pub mod logging;

pub use config::{GalleryConfig, GalleryConfigBuilder, StoreBackend};
pub use error::{Error, Result};
