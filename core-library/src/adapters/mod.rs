//! Store adapter implementations
//!
//! Concrete implementations of the bridge store traits:
//! - [`SqliteAdapter`] implements `DatabaseAdapter` over a sqlx pool
//! - [`InMemoryDocumentStore`] implements `DocumentStore` in process memory

pub mod memory_document;
pub mod sqlite_native;

pub use memory_document::InMemoryDocumentStore;
pub use sqlite_native::SqliteAdapter;
