//! Storage collaborator consumed by the service.
//!
//! # Design
//! `TodoRepository` is object-safe (`async-trait`) so the service can hold an
//! `Arc<dyn TodoRepository>` and the binary can pick a backend at start-up.
//! Each method is one atomic store operation: a concurrent reader observes a
//! row either before or after a write, never half-written. Read-modify-write
//! goes through `modify`, which holds the store's write lock for the whole
//! sequence. No consistency is promised across calls.

mod in_memory;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::StorageConfig;
use crate::model::{Priority, Todo};

pub use in_memory::InMemoryTodoRepository;
pub use sqlite::SqliteTodoRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// `save` or `modify` was asked to update a row that does not exist.
    #[error("todo {0} does not exist")]
    Missing(i64),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be turned back into a `Todo`.
    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

/// In-place edit applied by [`TodoRepository::modify`].
pub type Edit = Box<dyn FnOnce(&mut Todo) + Send>;

#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Inserts when `todo.id` is `None` (assigning id, `created_at` and
    /// `updated_at`), otherwise overwrites the row and refreshes `updated_at`.
    /// Returns the row as stored.
    async fn save(&self, todo: Todo) -> Result<Todo, RepositoryError>;

    /// Fetches row `id`, applies `edit` and stores the result as one atomic
    /// unit, refreshing `updated_at`. Concurrent modifications of the same row
    /// are serialized, so none of them is lost. Fails with `Missing` when the
    /// row does not exist.
    async fn modify(&self, id: i64, edit: Edit) -> Result<Todo, RepositoryError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Todo>, RepositoryError>;

    async fn exists_by_id(&self, id: i64) -> Result<bool, RepositoryError>;

    /// Returns whether a row was removed.
    async fn delete_by_id(&self, id: i64) -> Result<bool, RepositoryError>;

    /// All rows in id order.
    async fn find_all(&self) -> Result<Vec<Todo>, RepositoryError>;

    async fn find_by_completed(&self, completed: bool) -> Result<Vec<Todo>, RepositoryError>;

    async fn find_by_priority(&self, priority: Priority) -> Result<Vec<Todo>, RepositoryError>;

    /// Rows whose due date is strictly before `instant`. Rows without a due
    /// date never match.
    async fn find_by_due_date_before(
        &self,
        instant: DateTime<Utc>,
    ) -> Result<Vec<Todo>, RepositoryError>;

    /// Rows whose due date lies in the inclusive window `[start, end]`.
    async fn find_by_due_date_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Todo>, RepositoryError>;

    /// Case-insensitive substring match on title or description. The keyword
    /// is matched literally.
    async fn search_by_keyword(&self, keyword: &str) -> Result<Vec<Todo>, RepositoryError>;
}

/// Opens the backend selected by `storage`.
pub async fn open(storage: &StorageConfig) -> Result<Arc<dyn TodoRepository>, RepositoryError> {
    match storage {
        StorageConfig::InMemory => Ok(Arc::new(InMemoryTodoRepository::new())),
        StorageConfig::Sqlite {
            url,
            max_connections,
        } => Ok(Arc::new(
            SqliteTodoRepository::connect(url, *max_connections).await?,
        )),
    }
}
