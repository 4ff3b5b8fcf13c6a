//! Document Store Abstraction
//!
//! Collection / where-equals document API for document-oriented backends.
//! Repositories built on this trait behave identically to their SQL
//! counterparts.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;

/// A stored document: store-assigned id plus a JSON object of fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.fields.get(field).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.fields.get(field).and_then(Value::as_bool)
    }
}

/// Sort direction for [`DocumentStore::list_ordered`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Document store trait
///
/// # Example
///
/// ```ignore
/// let doc = store
///     .find_first_where("images", "original_url", &Value::from(url))
///     .await?;
/// ```
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// First document in `collection` whose `field` equals `value`.
    async fn find_first_where(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Document>>;

    /// Document by id.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Insert or replace a document under a caller-chosen id.
    async fn set(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<()>;

    /// Page through `collection` sorted by `order_by`.
    async fn list_ordered(
        &self,
        collection: &str,
        order_by: &str,
        order: SortOrder,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Document>>;

    /// Round-trip to the backend to confirm it is reachable.
    async fn ping(&self) -> Result<()>;
}
