//! User repository trait and implementations

use crate::error::{LibraryError, Result};
use crate::models::UserIdentity;
use crate::repositories::{
    conflict_on_duplicate, from_document, get_bool, get_i64, get_string, text, to_fields, USERS,
};
use async_trait::async_trait;
use bridge_traits::database::{DatabaseAdapter, QueryRow, QueryValue};
use bridge_traits::document::DocumentStore;
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;

/// User repository interface
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserIdentity>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserIdentity>>;

    /// Insert a user. A taken username is a `Conflict`.
    async fn insert(&self, user: &UserIdentity) -> Result<()>;
}

/// SQL implementation of UserRepository
pub struct SqliteUserRepository {
    adapter: Arc<dyn DatabaseAdapter>,
}

impl SqliteUserRepository {
    pub fn new(adapter: Arc<dyn DatabaseAdapter>) -> Self {
        Self { adapter }
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        use crate::adapters::sqlite_native::SqliteAdapter;
        Self::new(Arc::new(SqliteAdapter::from_pool(pool)))
    }

    async fn fetch_optional(&self, sql: &str, param: &str) -> Result<Option<UserIdentity>> {
        let row = self.adapter.query_one_optional(sql, &[text(param)]).await?;
        row.map(|row| row_to_user(&row)).transpose()
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserIdentity>> {
        self.fetch_optional("SELECT * FROM users WHERE id = ?", id)
            .await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserIdentity>> {
        self.fetch_optional("SELECT * FROM users WHERE username = ? LIMIT 1", username)
            .await
    }

    async fn insert(&self, user: &UserIdentity) -> Result<()> {
        self.adapter
            .execute(
                "INSERT INTO users (id, username, is_business, created_at) VALUES (?, ?, ?, ?)",
                &[
                    text(&user.id),
                    text(&user.username),
                    QueryValue::from(user.is_business),
                    QueryValue::Integer(user.created_at),
                ],
            )
            .await
            .map_err(conflict_on_duplicate("Username"))?;
        Ok(())
    }
}

fn row_to_user(row: &QueryRow) -> Result<UserIdentity> {
    Ok(UserIdentity {
        id: get_string(row, "id")?,
        username: get_string(row, "username")?,
        is_business: get_bool(row, "is_business")?,
        created_at: get_i64(row, "created_at")?,
    })
}

/// Document-store implementation of UserRepository
pub struct DocumentUserRepository {
    store: Arc<dyn DocumentStore>,
    /// Held across the username check and the write of an insert.
    writes: Mutex<()>,
}

impl DocumentUserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            writes: Mutex::new(()),
        }
    }
}

#[async_trait]
impl UserRepository for DocumentUserRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserIdentity>> {
        let doc = self.store.get(USERS, id).await?;
        doc.map(from_document).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserIdentity>> {
        let doc = self
            .store
            .find_first_where(USERS, "username", &Value::from(username))
            .await?;
        doc.map(from_document).transpose()
    }

    async fn insert(&self, user: &UserIdentity) -> Result<()> {
        let _writes = self.writes.lock().await;
        if self.find_by_username(&user.username).await?.is_some() {
            return Err(LibraryError::Conflict("Username".to_string()));
        }
        self.store.set(USERS, &user.id, to_fields(user)?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryDocumentStore;
    use crate::db::create_test_pool;
    use crate::models::fixtures;

    #[tokio::test]
    async fn test_insert_and_lookup_on_both_backends() {
        let pool = create_test_pool().await.unwrap();
        let repos: Vec<Box<dyn UserRepository>> = vec![
            Box::new(SqliteUserRepository::from_pool(pool)),
            Box::new(DocumentUserRepository::new(Arc::new(
                InMemoryDocumentStore::new(),
            ))),
        ];

        for repo in repos {
            let user = fixtures::user("u1", true);
            repo.insert(&user).await.unwrap();

            assert_eq!(repo.find_by_id("u1").await.unwrap(), Some(user.clone()));
            assert_eq!(
                repo.find_by_username(&user.username).await.unwrap(),
                Some(user)
            );
            assert!(repo.find_by_id("ghost").await.unwrap().is_none());
            assert!(repo.find_by_username("ghost").await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_is_a_conflict() {
        let pool = create_test_pool().await.unwrap();
        let repos: Vec<Box<dyn UserRepository>> = vec![
            Box::new(SqliteUserRepository::from_pool(pool)),
            Box::new(DocumentUserRepository::new(Arc::new(
                InMemoryDocumentStore::new(),
            ))),
        ];

        for repo in repos {
            repo.insert(&fixtures::user("u1", false)).await.unwrap();

            let mut twin = fixtures::user("u2", false);
            twin.username = "user-u1".to_string();
            let result = repo.insert(&twin).await;
            assert!(matches!(result, Err(LibraryError::Conflict(ref entity)) if entity == "Username"));
            assert!(repo.find_by_id("u2").await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_concurrent_inserts_keep_one_username() {
        let pool = create_test_pool().await.unwrap();
        let repos: Vec<Box<dyn UserRepository>> = vec![
            Box::new(SqliteUserRepository::from_pool(pool)),
            Box::new(DocumentUserRepository::new(Arc::new(
                InMemoryDocumentStore::new(),
            ))),
        ];

        for repo in repos {
            let first = fixtures::user("u1", false);
            let mut twin = fixtures::user("u2", true);
            twin.username = first.username.clone();

            let (a, b) = tokio::join!(repo.insert(&first), repo.insert(&twin));
            assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
            assert!(matches!(
                a.err().or(b.err()),
                Some(LibraryError::Conflict(_))
            ));
        }
    }
}
