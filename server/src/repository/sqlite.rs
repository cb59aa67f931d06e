//! SQLite-backed repository.
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE todos (
//!     id          INTEGER PRIMARY KEY AUTOINCREMENT,
//!     title       TEXT NOT NULL,
//!     description TEXT,
//!     completed   BOOLEAN,
//!     priority    TEXT,
//!     due_date    TEXT,
//!     created_at  TEXT NOT NULL,
//!     updated_at  TEXT NOT NULL
//! );
//! ```
//!
//! Timestamps are written as fixed-width UTC text (microsecond precision,
//! `Z` suffix) so `<`, `BETWEEN` and `ORDER BY` compare them correctly as
//! strings, which holds for years 0000 through 9999 (request validation keeps
//! due dates inside that range). Saves use `RETURNING` so the row handed back
//! is exactly what was stored. Keyword search folds case in Rust because
//! SQLite's `lower()` only folds ASCII.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, SqliteExecutor};

use super::{Edit, RepositoryError, TodoRepository};
use crate::model::{Priority, Todo};

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS todos (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    description TEXT,
    completed   BOOLEAN,
    priority    TEXT,
    due_date    TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
)";

const COLUMNS: &str =
    "id, title, description, completed, priority, due_date, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct SqliteTodoRepository {
    pool: SqlitePool,
}

impl SqliteTodoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database at `url` and ensures the
    /// `todos` table exists. `sqlite::memory:` databases live per connection,
    /// so pass `max_connections = 1` for them.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let repository = Self::new(pool);
        repository.migrate().await?;
        Ok(repository)
    }

    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        tracing::debug!("todos table ready");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_where(
        &self,
        clause: &str,
        binds: Vec<String>,
    ) -> Result<Vec<Todo>, RepositoryError> {
        let sql = format!("SELECT {COLUMNS} FROM todos WHERE {clause} ORDER BY id");
        let mut query = sqlx::query_as::<_, TodoRow>(&sql);
        for value in binds {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Todo::try_from).collect()
    }
}

/// Overwrites the mutable columns of row `id`, returning the stored row or
/// `None` when it does not exist.
async fn update_row<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
    todo: &Todo,
    updated_at: &str,
) -> Result<Option<TodoRow>, sqlx::Error> {
    let sql = format!(
        "UPDATE todos SET title = ?, description = ?, completed = ?, priority = ?, \
         due_date = ?, updated_at = ? WHERE id = ? RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, TodoRow>(&sql)
        .bind(todo.title.as_str())
        .bind(todo.description.as_deref())
        .bind(todo.completed)
        .bind(todo.priority.map(Priority::as_str))
        .bind(todo.due_date.map(encode_timestamp))
        .bind(updated_at)
        .bind(id)
        .fetch_optional(executor)
        .await
}

#[derive(Debug, FromRow)]
struct TodoRow {
    id: i64,
    title: String,
    description: Option<String>,
    completed: Option<bool>,
    priority: Option<String>,
    due_date: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<TodoRow> for Todo {
    type Error = RepositoryError;

    fn try_from(row: TodoRow) -> Result<Self, Self::Error> {
        let priority = row
            .priority
            .as_deref()
            .map(Priority::from_str)
            .transpose()
            .map_err(|e| RepositoryError::CorruptRow(format!("todo {}: priority {e}", row.id)))?;
        Ok(Todo {
            id: Some(row.id),
            title: row.title,
            description: row.description,
            completed: row.completed,
            priority,
            due_date: row.due_date.as_deref().map(decode_timestamp).transpose()?,
            created_at: Some(decode_timestamp(&row.created_at)?),
            updated_at: Some(decode_timestamp(&row.updated_at)?),
        })
    }
}

fn encode_timestamp(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RepositoryError::CorruptRow(format!("timestamp {raw:?}: {e}")))
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn save(&self, todo: Todo) -> Result<Todo, RepositoryError> {
        let now = encode_timestamp(Utc::now());

        let row = match todo.id {
            None => {
                let sql = format!(
                    "INSERT INTO todos (title, description, completed, priority, due_date, created_at, updated_at) \
                     VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {COLUMNS}"
                );
                sqlx::query_as::<_, TodoRow>(&sql)
                    .bind(&todo.title)
                    .bind(&todo.description)
                    .bind(todo.completed)
                    .bind(todo.priority.map(Priority::as_str))
                    .bind(todo.due_date.map(encode_timestamp))
                    .bind(&now)
                    .bind(&now)
                    .fetch_one(&self.pool)
                    .await?
            }
            Some(id) => update_row(&self.pool, id, &todo, &now)
                .await?
                .ok_or(RepositoryError::Missing(id))?,
        };
        Todo::try_from(row)
    }

    async fn modify(&self, id: i64, edit: Edit) -> Result<Todo, RepositoryError> {
        let now = encode_timestamp(Utc::now());
        let mut tx = self.pool.begin().await?;

        // Writing before reading takes the database write lock up front, so a
        // second `modify` waits here instead of reading the same stale row.
        let touched = sqlx::query("UPDATE todos SET updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(RepositoryError::Missing(id));
        }

        let sql = format!("SELECT {COLUMNS} FROM todos WHERE id = ?");
        let current = sqlx::query_as::<_, TodoRow>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        let mut todo = Todo::try_from(current)?;
        edit(&mut todo);

        let row = update_row(&mut *tx, id, &todo, &now)
            .await?
            .ok_or(RepositoryError::Missing(id))?;
        tx.commit().await?;
        Todo::try_from(row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Todo>, RepositoryError> {
        let sql = format!("SELECT {COLUMNS} FROM todos WHERE id = ?");
        sqlx::query_as::<_, TodoRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Todo::try_from)
            .transpose()
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM todos WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_all(&self) -> Result<Vec<Todo>, RepositoryError> {
        self.fetch_where("1 = 1", Vec::new()).await
    }

    async fn find_by_completed(&self, completed: bool) -> Result<Vec<Todo>, RepositoryError> {
        let sql = format!("SELECT {COLUMNS} FROM todos WHERE completed = ? ORDER BY id");
        let rows = sqlx::query_as::<_, TodoRow>(&sql)
            .bind(completed)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Todo::try_from).collect()
    }

    async fn find_by_priority(&self, priority: Priority) -> Result<Vec<Todo>, RepositoryError> {
        self.fetch_where("priority = ?", vec![priority.as_str().to_string()])
            .await
    }

    async fn find_by_due_date_before(
        &self,
        instant: DateTime<Utc>,
    ) -> Result<Vec<Todo>, RepositoryError> {
        self.fetch_where("due_date < ?", vec![encode_timestamp(instant)])
            .await
    }

    async fn find_by_due_date_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Todo>, RepositoryError> {
        self.fetch_where(
            "due_date BETWEEN ? AND ?",
            vec![encode_timestamp(start), encode_timestamp(end)],
        )
        .await
    }

    async fn search_by_keyword(&self, keyword: &str) -> Result<Vec<Todo>, RepositoryError> {
        let todos = self.find_all().await?;
        Ok(todos
            .into_iter()
            .filter(|todo| todo.matches_keyword(keyword))
            .collect())
    }
}
