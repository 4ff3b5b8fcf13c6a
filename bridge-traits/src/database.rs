//! Relational Store Abstraction
//!
//! Provides a driver-agnostic trait for SQL operations so repositories can
//! run against SQLite (via sqlx) or any other relational backend.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_traits::database::{DatabaseAdapter, QueryValue};
//!
//! let row = adapter
//!     .query_one_optional(
//!         "SELECT * FROM images WHERE original_url = ?",
//!         &[QueryValue::Text(url.to_string())],
//!     )
//!     .await?;
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

// =============================================================================
// Query Result Types
// =============================================================================

/// Represents a single row from a database query as a map of column names to values
pub type QueryRow = std::collections::HashMap<String, QueryValue>;

/// Represents a database value that can be null, integer, real, text, or blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl QueryValue {
    /// Convert to i64 if possible
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            QueryValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Convert to bool if possible (SQLite stores booleans as integers)
    pub fn as_bool(&self) -> Option<bool> {
        self.as_i64().map(|i| i != 0)
    }

    /// Convert to String if possible
    pub fn as_str(&self) -> Option<&str> {
        match self {
            QueryValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Convert to String (owned) if possible
    pub fn as_string(&self) -> Option<String> {
        self.as_str().map(str::to_string)
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, QueryValue::Null)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Integer(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Integer(i64::from(value))
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(QueryValue::Null)
    }
}

// =============================================================================
// Database Adapter Trait
// =============================================================================

/// Database adapter trait for relational backends
///
/// ## Error Handling
///
/// All methods return `Result<T>` using `BridgeError::DatabaseError` for
/// driver failures.
#[async_trait::async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// Check if the database connection is healthy
    async fn health_check(&self) -> Result<()>;

    /// Execute a raw SQL query and return rows
    ///
    /// Uses positional parameters. Never concatenate user input into the query.
    async fn query(&self, query: &str, params: &[QueryValue]) -> Result<Vec<QueryRow>>;

    /// Execute a SQL statement that doesn't return rows, returning rows affected
    async fn execute(&self, statement: &str, params: &[QueryValue]) -> Result<u64>;

    /// Execute a query and return a single optional row
    async fn query_one_optional(
        &self,
        query: &str,
        params: &[QueryValue],
    ) -> Result<Option<QueryRow>> {
        Ok(self.query(query, params).await?.into_iter().next())
    }
}
