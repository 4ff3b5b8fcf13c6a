//! # Repository Pattern Implementation
//!
//! Repository traits and their two backend implementations.
//!
//! ## Architecture
//!
//! - Traits define the interface for each entity
//! - `Sqlite*` implementations run SQL through a `DatabaseAdapter`
//! - `Document*` implementations run against a `DocumentStore`
//! - Both behave identically for every operation, including refusing a
//!   second image for the same URL or a second user with the same name
//!
//! ## Available Repositories
//!
//! - `ImageRepository` - Provider image metadata keyed by original URL
//! - `UserRepository` - Requester identities
//! - `CanvasRepository` - Canvas placements of images

pub mod canvas;
pub mod image;
pub mod user;

use std::sync::Arc;

use bridge_traits::database::{DatabaseAdapter, QueryRow, QueryValue};
use bridge_traits::document::{Document, DocumentStore};
use bridge_traits::error::BridgeError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LibraryError, Result};

pub use canvas::{CanvasRepository, DocumentCanvasRepository, SqliteCanvasRepository};
pub use image::{DocumentImageRepository, ImageRepository, SqliteImageRepository};
pub use user::{DocumentUserRepository, SqliteUserRepository, UserRepository};

/// Collection names used by the document backend.
pub(crate) const IMAGES: &str = "images";
pub(crate) const USERS: &str = "users";
pub(crate) const CANVAS_EMBEDS: &str = "canvas_embeds";

/// Turn a unique-key collision into a `Conflict` naming `entity`.
pub(crate) fn conflict_on_duplicate(entity: &'static str) -> impl FnOnce(BridgeError) -> LibraryError {
    move |error| match error {
        BridgeError::ConstraintViolation(_) => LibraryError::Conflict(entity.to_string()),
        other => LibraryError::Bridge(other),
    }
}

/// Largest page a single listing may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Limit/offset window for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u32,
}

impl PageRequest {
    /// Create a page request. `limit` is clamped to `1..=MAX_PAGE_SIZE`.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_library::repositories::PageRequest;
    ///
    /// let request = PageRequest::new(500, 40);
    /// assert_eq!(request.limit, 100);
    /// assert_eq!(request.offset, 40);
    /// ```
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_SIZE),
            offset,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

/// The repository set backing a metadata store.
#[derive(Clone)]
pub struct Repositories {
    pub images: Arc<dyn ImageRepository>,
    pub users: Arc<dyn UserRepository>,
    pub canvas: Arc<dyn CanvasRepository>,
}

impl Repositories {
    /// Relational backend.
    pub fn sql(adapter: Arc<dyn DatabaseAdapter>) -> Self {
        Self {
            images: Arc::new(SqliteImageRepository::new(Arc::clone(&adapter))),
            users: Arc::new(SqliteUserRepository::new(Arc::clone(&adapter))),
            canvas: Arc::new(SqliteCanvasRepository::new(adapter)),
        }
    }

    /// Document backend.
    pub fn document(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            images: Arc::new(DocumentImageRepository::new(Arc::clone(&store))),
            users: Arc::new(DocumentUserRepository::new(Arc::clone(&store))),
            canvas: Arc::new(DocumentCanvasRepository::new(store)),
        }
    }
}

// =============================================================================
// Row helpers (relational backend)
// =============================================================================

pub(crate) fn get_string(row: &QueryRow, key: &str) -> Result<String> {
    row.get(key)
        .and_then(|value| value.as_string())
        .ok_or_else(|| missing_column(key))
}

pub(crate) fn get_i64(row: &QueryRow, key: &str) -> Result<i64> {
    row.get(key)
        .and_then(|value| value.as_i64())
        .ok_or_else(|| missing_column(key))
}

pub(crate) fn get_bool(row: &QueryRow, key: &str) -> Result<bool> {
    row.get(key)
        .and_then(|value| value.as_bool())
        .ok_or_else(|| missing_column(key))
}

fn missing_column(column: &str) -> LibraryError {
    LibraryError::Corrupt(format!("missing column '{}' in result set", column))
}

pub(crate) fn text(value: &str) -> QueryValue {
    QueryValue::Text(value.to_string())
}

// =============================================================================
// Document helpers (document backend)
// =============================================================================

/// Serialize `value` into the field map of a document.
pub(crate) fn to_fields<T: Serialize>(value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value) {
        Ok(Value::Object(mut fields)) => {
            fields.remove("id");
            Ok(fields)
        }
        Ok(other) => Err(LibraryError::Corrupt(format!(
            "expected an object, serialized {}",
            other
        ))),
        Err(e) => Err(LibraryError::Corrupt(e.to_string())),
    }
}

/// Rebuild a model from a document, restoring its id.
pub(crate) fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    let mut fields = doc.fields;
    fields.insert("id".to_string(), Value::String(doc.id.clone()));
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| LibraryError::Corrupt(format!("document {}: {}", doc.id, e)))
}
