//! Image repository trait and implementations

use crate::error::{LibraryError, Result};
use crate::models::{ImageMetadata, ImageRecord};
use crate::repositories::{
    conflict_on_duplicate, from_document, get_bool, get_i64, get_string, text, to_fields,
    PageRequest, IMAGES,
};
use async_trait::async_trait;
use bridge_traits::database::{DatabaseAdapter, QueryRow, QueryValue};
use bridge_traits::document::{DocumentStore, SortOrder};
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Image repository interface for data access operations
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Find the record saved for `url`
    ///
    /// # Returns
    /// - `Ok(Some(record))` if found
    /// - `Ok(None)` if not found
    /// - `Err` if the backend fails
    async fn find_by_url(&self, url: &str) -> Result<Option<ImageRecord>>;

    /// Find a record by its id
    async fn find_by_id(&self, id: &str) -> Result<Option<ImageRecord>>;

    /// Insert a new record.
    ///
    /// # Errors
    /// - `InvalidInput` if the metadata fails validation
    /// - `Conflict` if a record for the same URL already exists
    /// - backend errors otherwise
    async fn insert(&self, record: &ImageRecord) -> Result<()>;

    /// Newest records first
    async fn list_recent(&self, page: PageRequest) -> Result<Vec<ImageRecord>>;

    /// Confirm the backend is reachable
    async fn ping(&self) -> Result<()>;
}

fn validate_record(record: &ImageRecord) -> Result<()> {
    record
        .metadata
        .validate()
        .map_err(|msg| LibraryError::InvalidInput {
            field: "ImageRecord".to_string(),
            message: msg,
        })
}

// =============================================================================
// SQL
// =============================================================================

/// SQL implementation of ImageRepository
pub struct SqliteImageRepository {
    adapter: Arc<dyn DatabaseAdapter>,
}

impl SqliteImageRepository {
    /// Create a new repository using the provided database adapter.
    pub fn new(adapter: Arc<dyn DatabaseAdapter>) -> Self {
        Self { adapter }
    }

    /// Convenience constructor using an existing `sqlx` pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        use crate::adapters::sqlite_native::SqliteAdapter;
        Self::new(Arc::new(SqliteAdapter::from_pool(pool)))
    }

    fn insert_params(record: &ImageRecord) -> Vec<QueryValue> {
        let m = &record.metadata;
        vec![
            text(&record.id),
            text(&m.source_provider),
            text(&m.original_url),
            text(&m.embed_html),
            text(&m.license_type),
            text(&m.license_url),
            QueryValue::from(m.commercial_allowed),
            text(&m.attribution_text),
            QueryValue::from(m.provider_attribution_required),
            text(&m.author_name),
            text(&m.author_url),
            text(&m.image_url),
            text(&m.thumbnail_url),
            text(&m.title),
            text(&m.description),
            QueryValue::Integer(record.fetched_at),
            QueryValue::Integer(record.last_checked_at),
        ]
    }

    async fn fetch_optional(&self, sql: &str, params: Vec<QueryValue>) -> Result<Option<ImageRecord>> {
        let row = self.adapter.query_one_optional(sql, &params).await?;
        row.map(|row| row_to_image(&row)).transpose()
    }
}

#[async_trait]
impl ImageRepository for SqliteImageRepository {
    async fn find_by_url(&self, url: &str) -> Result<Option<ImageRecord>> {
        self.fetch_optional(
            "SELECT * FROM images WHERE original_url = ? LIMIT 1",
            vec![text(url)],
        )
        .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ImageRecord>> {
        self.fetch_optional("SELECT * FROM images WHERE id = ?", vec![text(id)])
            .await
    }

    async fn insert(&self, record: &ImageRecord) -> Result<()> {
        validate_record(record)?;
        self.adapter
            .execute(
                r#"
                INSERT INTO images (
                    id, source_provider, original_url, embed_html, license_type, license_url,
                    commercial_allowed, attribution_text, provider_attribution_required,
                    author_name, author_url, image_url, thumbnail_url, title, description,
                    fetched_at, last_checked_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
                &Self::insert_params(record),
            )
            .await
            .map_err(conflict_on_duplicate("Image"))?;
        Ok(())
    }

    async fn list_recent(&self, page: PageRequest) -> Result<Vec<ImageRecord>> {
        let rows = self
            .adapter
            .query(
                "SELECT * FROM images ORDER BY fetched_at DESC, rowid ASC LIMIT ? OFFSET ?",
                &[
                    QueryValue::Integer(i64::from(page.limit)),
                    QueryValue::Integer(i64::from(page.offset)),
                ],
            )
            .await?;
        rows.iter().map(row_to_image).collect()
    }

    async fn ping(&self) -> Result<()> {
        self.adapter.health_check().await?;
        Ok(())
    }
}

fn row_to_image(row: &QueryRow) -> Result<ImageRecord> {
    Ok(ImageRecord {
        id: get_string(row, "id")?,
        metadata: ImageMetadata {
            source_provider: get_string(row, "source_provider")?,
            original_url: get_string(row, "original_url")?,
            embed_html: get_string(row, "embed_html")?,
            license_type: get_string(row, "license_type")?,
            license_url: get_string(row, "license_url")?,
            commercial_allowed: get_bool(row, "commercial_allowed")?,
            attribution_text: get_string(row, "attribution_text")?,
            provider_attribution_required: get_bool(row, "provider_attribution_required")?,
            author_name: get_string(row, "author_name")?,
            author_url: get_string(row, "author_url")?,
            image_url: get_string(row, "image_url")?,
            thumbnail_url: get_string(row, "thumbnail_url")?,
            title: get_string(row, "title")?,
            description: get_string(row, "description")?,
        },
        fetched_at: get_i64(row, "fetched_at")?,
        last_checked_at: get_i64(row, "last_checked_at")?,
    })
}

// =============================================================================
// Document
// =============================================================================

/// Document-store implementation of ImageRepository
pub struct DocumentImageRepository {
    store: Arc<dyn DocumentStore>,
    /// Held across the URL check and the write of an insert.
    writes: Mutex<()>,
}

impl DocumentImageRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            writes: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ImageRepository for DocumentImageRepository {
    async fn find_by_url(&self, url: &str) -> Result<Option<ImageRecord>> {
        let doc = self
            .store
            .find_first_where(IMAGES, "original_url", &Value::from(url))
            .await?;
        doc.map(from_document).transpose()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ImageRecord>> {
        let doc = self.store.get(IMAGES, id).await?;
        doc.map(from_document).transpose()
    }

    async fn insert(&self, record: &ImageRecord) -> Result<()> {
        validate_record(record)?;

        let _writes = self.writes.lock().await;
        if self.find_by_url(record.original_url()).await?.is_some() {
            return Err(LibraryError::Conflict("Image".to_string()));
        }
        self.store.set(IMAGES, &record.id, to_fields(record)?).await?;
        Ok(())
    }

    async fn list_recent(&self, page: PageRequest) -> Result<Vec<ImageRecord>> {
        let docs = self
            .store
            .list_ordered(
                IMAGES,
                "fetched_at",
                SortOrder::Descending,
                page.limit as usize,
                page.offset as usize,
            )
            .await?;
        docs.into_iter().map(from_document).collect()
    }

    async fn ping(&self) -> Result<()> {
        self.store.ping().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryDocumentStore;
    use crate::db::create_test_pool;
    use crate::models::fixtures;

    const URL: &str = "https://www.instagram.com/p/abc123/";

    async fn backends() -> Vec<(&'static str, Box<dyn ImageRepository>)> {
        let pool = create_test_pool().await.unwrap();
        vec![
            ("sql", Box::new(SqliteImageRepository::from_pool(pool))),
            (
                "document",
                Box::new(DocumentImageRepository::new(Arc::new(
                    InMemoryDocumentStore::new(),
                ))),
            ),
        ]
    }

    #[tokio::test]
    async fn test_insert_and_find_by_url() {
        for (name, repo) in backends().await {
            let record = ImageRecord::from_metadata(fixtures::metadata(URL, false), 1_000);
            repo.insert(&record).await.unwrap();

            let found = repo.find_by_url(URL).await.unwrap();
            assert_eq!(found.as_ref(), Some(&record), "backend {}", name);

            let by_id = repo.find_by_id(&record.id).await.unwrap();
            assert_eq!(by_id, Some(record), "backend {}", name);

            assert!(repo.find_by_url("https://other").await.unwrap().is_none());
            assert!(repo.ping().await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_duplicate_url_is_a_conflict() {
        for (name, repo) in backends().await {
            let first = ImageRecord::from_metadata(fixtures::metadata(URL, false), 1_000);
            let second = ImageRecord::from_metadata(fixtures::metadata(URL, true), 2_000);
            repo.insert(&first).await.unwrap();

            let result = repo.insert(&second).await;
            assert!(
                matches!(result, Err(LibraryError::Conflict(ref entity)) if entity == "Image"),
                "backend {}",
                name
            );

            let found = repo.find_by_url(URL).await.unwrap().unwrap();
            assert_eq!(found.id, first.id, "backend {}", name);
            assert!(repo.find_by_id(&second.id).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_concurrent_inserts_keep_one_record_per_url() {
        for (name, repo) in backends().await {
            let first = ImageRecord::from_metadata(fixtures::metadata(URL, true), 1_000);
            let second = ImageRecord::from_metadata(fixtures::metadata(URL, true), 1_000);

            let (a, b) = tokio::join!(repo.insert(&first), repo.insert(&second));
            assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1, "backend {}", name);

            let all = repo.list_recent(PageRequest::default()).await.unwrap();
            assert_eq!(all.len(), 1, "backend {}", name);
        }
    }

    #[tokio::test]
    async fn test_list_recent_newest_first() {
        for (name, repo) in backends().await {
            for (i, ts) in [100, 300, 200].into_iter().enumerate() {
                let url = format!("https://www.instagram.com/p/post{}/", i);
                let record = ImageRecord::from_metadata(fixtures::metadata(&url, true), ts);
                repo.insert(&record).await.unwrap();
            }

            let page = repo.list_recent(PageRequest::new(2, 0)).await.unwrap();
            let stamps: Vec<i64> = page.iter().map(|r| r.fetched_at).collect();
            assert_eq!(stamps, vec![300, 200], "backend {}", name);

            let rest = repo.list_recent(PageRequest::new(2, 2)).await.unwrap();
            assert_eq!(rest.len(), 1, "backend {}", name);
            assert_eq!(rest[0].fetched_at, 100);
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_record() {
        for (_, repo) in backends().await {
            let mut metadata = fixtures::metadata(URL, true);
            metadata.license_type = String::new();
            let record = ImageRecord::from_metadata(metadata, 1);

            let result = repo.insert(&record).await;
            assert!(matches!(result, Err(LibraryError::InvalidInput { .. })));
        }
    }
}
