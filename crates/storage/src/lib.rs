//! Todo persistence behind the four operations the agent's tools need.
//!
//! The agent treats the store as opaque: it only relies on each operation
//! being atomic on its own and on `create_todo` returning an id that
//! `delete_todo` accepts.

pub mod error;
pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use tada_core::config::PostgresConfig;
use tada_core::Todo;
use tracing::info;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Every todo, in insertion order.
    async fn get_all_todos(&self) -> Result<Vec<Todo>, StorageError>;

    /// Persist a new todo and return its assigned id.
    async fn create_todo(&self, text: &str) -> Result<i64, StorageError>;

    /// Todos whose text contains `keyword`, ignoring case.
    async fn search_todos(&self, keyword: &str) -> Result<Vec<Todo>, StorageError>;

    /// Remove a todo. Returns whether a record was actually removed; a
    /// missing id is not an error.
    async fn delete_todo(&self, id: i64) -> Result<bool, StorageError>;

    /// Backend name for logging.
    fn backend_name(&self) -> &str;
}

/// Open the configured store: PostgreSQL when `DATABASE_URL` is set,
/// otherwise a process-local in-memory store.
pub async fn open_store(config: &PostgresConfig) -> Result<Arc<dyn TodoStore>, StorageError> {
    if config.is_configured() {
        let store = PgStore::connect(config).await?;
        Ok(Arc::new(store))
    } else {
        info!("Storage: DATABASE_URL not set, using in-memory store");
        Ok(Arc::new(MemoryStore::new()))
    }
}
