//! Canvas embed repository trait and implementations

use crate::error::{LibraryError, Result};
use crate::models::{CanvasEmbed, EmbedPosition};
use crate::repositories::{from_document, get_i64, get_string, text, to_fields, CANVAS_EMBEDS};
use async_trait::async_trait;
use bridge_traits::database::{DatabaseAdapter, QueryRow, QueryValue};
use bridge_traits::document::{DocumentStore, SortOrder};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Canvas embed repository interface
#[async_trait]
pub trait CanvasRepository: Send + Sync {
    /// Insert a placement. Callers check that the user and image exist.
    async fn insert(&self, embed: &CanvasEmbed) -> Result<()>;

    /// Placements on `canvas_id` in insertion order
    async fn list_by_canvas(&self, canvas_id: &str) -> Result<Vec<CanvasEmbed>>;
}

/// SQL implementation of CanvasRepository
pub struct SqliteCanvasRepository {
    adapter: Arc<dyn DatabaseAdapter>,
}

impl SqliteCanvasRepository {
    pub fn new(adapter: Arc<dyn DatabaseAdapter>) -> Self {
        Self { adapter }
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        use crate::adapters::sqlite_native::SqliteAdapter;
        Self::new(Arc::new(SqliteAdapter::from_pool(pool)))
    }
}

#[async_trait]
impl CanvasRepository for SqliteCanvasRepository {
    async fn insert(&self, embed: &CanvasEmbed) -> Result<()> {
        let position = serde_json::to_string(&embed.embed_position)
            .map_err(|e| LibraryError::Corrupt(e.to_string()))?;

        self.adapter
            .execute(
                r#"
                INSERT INTO canvas_embeds (
                    id, canvas_id, image_id, owner_user_id, embed_position, note, inserted_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
                &[
                    text(&embed.id),
                    text(&embed.canvas_id),
                    text(&embed.image_id),
                    text(&embed.owner_user_id),
                    QueryValue::Text(position),
                    text(&embed.note),
                    QueryValue::Integer(embed.inserted_at),
                ],
            )
            .await?;
        Ok(())
    }

    async fn list_by_canvas(&self, canvas_id: &str) -> Result<Vec<CanvasEmbed>> {
        let rows = self
            .adapter
            .query(
                "SELECT * FROM canvas_embeds WHERE canvas_id = ? ORDER BY inserted_at ASC, rowid ASC",
                &[text(canvas_id)],
            )
            .await?;
        rows.iter().map(row_to_embed).collect()
    }
}

fn row_to_embed(row: &QueryRow) -> Result<CanvasEmbed> {
    let position = get_string(row, "embed_position")?;
    let embed_position: EmbedPosition = serde_json::from_str(&position)
        .map_err(|e| LibraryError::Corrupt(format!("embed_position: {}", e)))?;

    Ok(CanvasEmbed {
        id: get_string(row, "id")?,
        canvas_id: get_string(row, "canvas_id")?,
        image_id: get_string(row, "image_id")?,
        owner_user_id: get_string(row, "owner_user_id")?,
        embed_position,
        note: get_string(row, "note")?,
        inserted_at: get_i64(row, "inserted_at")?,
    })
}

/// Document-store implementation of CanvasRepository
pub struct DocumentCanvasRepository {
    store: Arc<dyn DocumentStore>,
}

impl DocumentCanvasRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CanvasRepository for DocumentCanvasRepository {
    async fn insert(&self, embed: &CanvasEmbed) -> Result<()> {
        self.store
            .set(CANVAS_EMBEDS, &embed.id, to_fields(embed)?)
            .await?;
        Ok(())
    }

    async fn list_by_canvas(&self, canvas_id: &str) -> Result<Vec<CanvasEmbed>> {
        let docs = self
            .store
            .list_ordered(CANVAS_EMBEDS, "inserted_at", SortOrder::Ascending, usize::MAX, 0)
            .await?;
        docs.into_iter()
            .filter(|doc| doc.get_str("canvas_id") == Some(canvas_id))
            .map(from_document)
            .collect()
    }
}
