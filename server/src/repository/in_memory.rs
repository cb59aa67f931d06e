use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{Edit, RepositoryError, TodoRepository};
use crate::model::{Priority, Todo};

#[derive(Debug, Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, Todo>,
}

/// Process-local store. Ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct InMemoryTodoRepository {
    table: RwLock<Table>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn filter(&self, predicate: impl Fn(&Todo) -> bool) -> Vec<Todo> {
        let table = self.table.read().await;
        table
            .rows
            .values()
            .filter(|todo| predicate(todo))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn save(&self, mut todo: Todo) -> Result<Todo, RepositoryError> {
        let mut table = self.table.write().await;
        let now = Utc::now();
        match todo.id {
            None => {
                table.last_id += 1;
                let id = table.last_id;
                todo.id = Some(id);
                todo.created_at = Some(now);
                todo.updated_at = Some(now);
                table.rows.insert(id, todo.clone());
            }
            Some(id) => {
                let existing = table.rows.get_mut(&id).ok_or(RepositoryError::Missing(id))?;
                todo.created_at = existing.created_at;
                todo.updated_at = Some(now);
                *existing = todo.clone();
            }
        }
        Ok(todo)
    }

    async fn modify(&self, id: i64, edit: Edit) -> Result<Todo, RepositoryError> {
        let mut table = self.table.write().await;
        let row = table.rows.get_mut(&id).ok_or(RepositoryError::Missing(id))?;
        let created_at = row.created_at;
        edit(row);
        row.id = Some(id);
        row.created_at = created_at;
        row.updated_at = Some(Utc::now());
        Ok(row.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Todo>, RepositoryError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool, RepositoryError> {
        Ok(self.table.read().await.rows.contains_key(&id))
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, RepositoryError> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }

    async fn find_all(&self) -> Result<Vec<Todo>, RepositoryError> {
        Ok(self.filter(|_| true).await)
    }

    async fn find_by_completed(&self, completed: bool) -> Result<Vec<Todo>, RepositoryError> {
        Ok(self.filter(|todo| todo.completed == Some(completed)).await)
    }

    async fn find_by_priority(&self, priority: Priority) -> Result<Vec<Todo>, RepositoryError> {
        Ok(self.filter(|todo| todo.priority == Some(priority)).await)
    }

    async fn find_by_due_date_before(
        &self,
        instant: DateTime<Utc>,
    ) -> Result<Vec<Todo>, RepositoryError> {
        Ok(self
            .filter(|todo| todo.due_date.is_some_and(|due| due < instant))
            .await)
    }

    async fn find_by_due_date_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Todo>, RepositoryError> {
        Ok(self
            .filter(|todo| todo.due_date.is_some_and(|due| start <= due && due <= end))
            .await)
    }

    async fn search_by_keyword(&self, keyword: &str) -> Result<Vec<Todo>, RepositoryError> {
        Ok(self.filter(|todo| todo.matches_keyword(keyword)).await)
    }
}
