//! In-process document store
//!
//! Backs the document-oriented store backend (`GALLERY_STORE=memory`) and
//! the document repository tests. Collections keep insertion order, so
//! `find_first_where` returns the earliest matching document.

use async_trait::async_trait;
use bridge_traits::document::{Document, DocumentStore, SortOrder};
use bridge_traits::error::Result;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

fn compare_field(a: &Document, b: &Document, field: &str) -> Ordering {
    match (a.fields.get(field), b.fields.get(field)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find_first_where(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|docs| {
            docs.iter()
                .find(|doc| doc.fields.get(field) == Some(value))
                .cloned()
        }))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id).cloned()))
    }

    async fn set(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<()> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        match docs.iter_mut().find(|doc| doc.id == id) {
            Some(existing) => existing.fields = fields,
            None => docs.push(Document::new(id, fields)),
        }

        debug!(collection, id, "Document set");
        Ok(())
    }

    async fn list_ordered(
        &self,
        collection: &str,
        order_by: &str,
        order: SortOrder,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut sorted: Vec<&Document> = docs.iter().collect();
        // Stable sort keeps insertion order among equal keys.
        sorted.sort_by(|a, b| {
            let ordering = compare_field(a, b, order_by);
            match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });

        Ok(sorted
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
