//! Native SQLite Database Adapter
//!
//! Implements the `DatabaseAdapter` trait using `sqlx` with the native SQLite
//! driver. Pool setup and migrations live in [`crate::db`].

use async_trait::async_trait;
use bridge_traits::database::{DatabaseAdapter, QueryRow, QueryValue};
use bridge_traits::error::{BridgeError, Result};
use sqlx::{Column, Pool, Row, Sqlite};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Native SQLite implementation of DatabaseAdapter
pub struct SqliteAdapter {
    pool: Pool<Sqlite>,
}

impl SqliteAdapter {
    /// Wrap an existing, migrated pool
    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Convert a sqlx Row to a QueryRow (HashMap)
    fn row_to_query_row(row: &sqlx::sqlite::SqliteRow) -> QueryRow {
        let mut result = HashMap::new();

        for column in row.columns() {
            let column_name = column.name().to_string();

            let value = if let Ok(v) = row.try_get::<Option<i64>, _>(column.ordinal()) {
                v.map(QueryValue::Integer).unwrap_or(QueryValue::Null)
            } else if let Ok(v) = row.try_get::<Option<f64>, _>(column.ordinal()) {
                v.map(QueryValue::Real).unwrap_or(QueryValue::Null)
            } else if let Ok(v) = row.try_get::<Option<String>, _>(column.ordinal()) {
                v.map(QueryValue::Text).unwrap_or(QueryValue::Null)
            } else if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(column.ordinal()) {
                v.map(QueryValue::Blob).unwrap_or(QueryValue::Null)
            } else {
                QueryValue::Null
            };

            result.insert(column_name, value);
        }

        result
    }

    /// Convert QueryValue parameters to sqlx-compatible format
    fn bind_params<'q>(
        query: sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
        params: &'q [QueryValue],
    ) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        let mut query = query;
        for param in params {
            query = match param {
                QueryValue::Null => query.bind(None::<i64>),
                QueryValue::Integer(i) => query.bind(i),
                QueryValue::Real(r) => query.bind(r),
                QueryValue::Text(s) => query.bind(s.as_str()),
                QueryValue::Blob(b) => query.bind(b.as_slice()),
            };
        }
        query
    }
}

/// Unique-key collisions are reported separately so repositories can answer
/// with a conflict instead of a storage failure.
fn execute_error(error: sqlx::Error) -> BridgeError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            BridgeError::ConstraintViolation(db.message().to_string())
        }
        _ => BridgeError::DatabaseError(format!("Execute failed: {}", error)),
    }
}

#[async_trait]
impl DatabaseAdapter for SqliteAdapter {
    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Database health check failed");
                BridgeError::DatabaseError(format!("Health check failed: {}", e))
            })?;

        debug!("Database health check passed");
        Ok(())
    }

    async fn query(&self, query: &str, params: &[QueryValue]) -> Result<Vec<QueryRow>> {
        debug!(query = %query, param_count = params.len(), "Executing query");

        let sqlx_query = Self::bind_params(sqlx::query(query), params);

        let rows = sqlx_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(rows.iter().map(Self::row_to_query_row).collect())
    }

    async fn execute(&self, statement: &str, params: &[QueryValue]) -> Result<u64> {
        debug!(statement = %statement, param_count = params.len(), "Executing statement");

        let sqlx_query = Self::bind_params(sqlx::query(statement), params);

        let result = sqlx_query
            .execute(&self.pool)
            .await
            .map_err(execute_error)?;

        Ok(result.rows_affected())
    }

    async fn query_one_optional(
        &self,
        query: &str,
        params: &[QueryValue],
    ) -> Result<Option<QueryRow>> {
        let sqlx_query = Self::bind_params(sqlx::query(query), params);

        let row = sqlx_query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(row.as_ref().map(Self::row_to_query_row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[tokio::test]
    async fn test_query_round_trips_values() {
        let adapter = SqliteAdapter::from_pool(create_test_pool().await.unwrap());

        let affected = adapter
            .execute(
                "INSERT INTO users (id, username, is_business, created_at) VALUES (?, ?, ?, ?)",
                &[
                    QueryValue::from("u1"),
                    QueryValue::from("alice"),
                    QueryValue::from(true),
                    QueryValue::Integer(123),
                ],
            )
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let row = adapter
            .query_one_optional("SELECT * FROM users WHERE id = ?", &[QueryValue::from("u1")])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(row.get("username").and_then(|v| v.as_str()), Some("alice"));
        assert_eq!(row.get("is_business").and_then(|v| v.as_bool()), Some(true));
        assert_eq!(row.get("created_at").and_then(|v| v.as_i64()), Some(123));
    }

    #[tokio::test]
    async fn test_missing_row_is_none() {
        let adapter = SqliteAdapter::from_pool(create_test_pool().await.unwrap());

        let row = adapter
            .query_one_optional("SELECT * FROM users WHERE id = ?", &[QueryValue::from("nope")])
            .await
            .unwrap();
        assert!(row.is_none());
        assert!(adapter.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_unique_violation_maps_to_constraint_error() {
        let adapter = SqliteAdapter::from_pool(create_test_pool().await.unwrap());
        let insert = "INSERT INTO users (id, username, is_business, created_at) VALUES (?, ?, ?, ?)";

        adapter
            .execute(
                insert,
                &[
                    QueryValue::from("u1"),
                    QueryValue::from("alice"),
                    QueryValue::from(false),
                    QueryValue::Integer(1),
                ],
            )
            .await
            .unwrap();
        let err = adapter
            .execute(
                insert,
                &[
                    QueryValue::from("u2"),
                    QueryValue::from("alice"),
                    QueryValue::from(false),
                    QueryValue::Integer(2),
                ],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn test_invalid_sql_maps_to_database_error() {
        let adapter = SqliteAdapter::from_pool(create_test_pool().await.unwrap());

        let err = adapter.query("SELECT * FROM nowhere", &[]).await.unwrap_err();
        assert!(matches!(err, BridgeError::DatabaseError(_)));
    }
}
