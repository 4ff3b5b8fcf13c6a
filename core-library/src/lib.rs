//! # Gallery Library Module
//!
//! Owns the gallery's persisted state and the cache in front of it.
//!
//! ## Overview
//!
//! This module manages:
//! - Image, user and canvas models with validation
//! - SQLite schema and migrations (relational backend)
//! - An in-memory document store (document backend)
//! - Repositories with identical behavior on both backends
//! - The TTL cache shared by the store and the metadata fetcher
//! - Per-URL locking for the fetch and persist paths
//! - The metadata store and its license gate

pub mod adapters;
pub mod cache;
pub mod db;
pub mod error;
pub mod keyed_lock;
pub mod license;
pub mod models;
pub mod repositories;
pub mod store;

pub use cache::{CacheStats, TtlCache};
pub use error::{LibraryError, Result};
pub use keyed_lock::KeyedLock;
pub use license::{RejectionReason, ValidationResult};
pub use store::MetadataStore;
