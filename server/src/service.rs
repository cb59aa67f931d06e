//! Use-case layer: one method per API operation.
//!
//! # Design
//! `TodoService` owns an `Arc<dyn TodoRepository>` handed to it at
//! construction and is cheap to clone into router state. Each method makes
//! one or two repository calls, applies creation defaults, and turns a missing
//! row into `ServiceError::NotFound`. Update and toggle hand their edit to
//! `TodoRepository::modify` so the fetch-modify-save runs as one atomic unit.
//! Request-body validation happens before a request reaches this layer.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::mapper;
use crate::model::{CreateTodoRequest, Priority, Todo, TodoResponse, UpdateTodoRequest};
use crate::repository::{RepositoryError, TodoRepository};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Todo not found with id: {0}")]
    NotFound(i64),

    /// Field name → violation message.
    #[error("validation failed for {}", .0.keys().cloned().collect::<Vec<_>>().join(", "))]
    Validation(BTreeMap<String, String>),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl ServiceError {
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::Validation(BTreeMap::from([(field.into(), message.into())]))
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Missing(id) => ServiceError::NotFound(id),
            other => ServiceError::Repository(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Clone)]
pub struct TodoService {
    repository: Arc<dyn TodoRepository>,
}

impl TodoService {
    pub fn new(repository: Arc<dyn TodoRepository>) -> Self {
        Self { repository }
    }

    #[tracing::instrument(skip_all)]
    pub async fn create(&self, request: CreateTodoRequest) -> ServiceResult<TodoResponse> {
        let mut todo = mapper::to_record(request);
        todo.completed.get_or_insert(false);
        todo.priority.get_or_insert(Priority::Medium);
        let saved = self.repository.save(todo).await?;
        tracing::info!(id = ?saved.id, "todo created");
        Ok(mapper::to_response(saved))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_all(&self) -> ServiceResult<Vec<TodoResponse>> {
        let todos = self.repository.find_all().await?;
        Ok(todos.into_iter().map(mapper::to_response).collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: i64) -> ServiceResult<TodoResponse> {
        let todo = self.repository.find_by_id(id).await?;
        mapper::to_response_opt(todo).ok_or(ServiceError::NotFound(id))
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update(&self, id: i64, request: UpdateTodoRequest) -> ServiceResult<TodoResponse> {
        let saved = self
            .repository
            .modify(id, Box::new(move |todo: &mut Todo| mapper::apply_update(request, todo)))
            .await?;
        tracing::info!(id, "todo updated");
        Ok(mapper::to_response(saved))
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        if !self.repository.exists_by_id(id).await? {
            return Err(ServiceError::NotFound(id));
        }
        if !self.repository.delete_by_id(id).await? {
            return Err(ServiceError::NotFound(id));
        }
        tracing::info!(id, "todo deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_status(&self, completed: bool) -> ServiceResult<Vec<TodoResponse>> {
        let todos = self.repository.find_by_completed(completed).await?;
        Ok(todos.into_iter().map(mapper::to_response).collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_priority(&self, priority: Priority) -> ServiceResult<Vec<TodoResponse>> {
        let todos = self.repository.find_by_priority(priority).await?;
        Ok(todos.into_iter().map(mapper::to_response).collect())
    }

    /// Incomplete todos due strictly before now.
    pub async fn get_overdue(&self) -> ServiceResult<Vec<TodoResponse>> {
        self.get_overdue_at(Utc::now()).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_overdue_at(&self, now: DateTime<Utc>) -> ServiceResult<Vec<TodoResponse>> {
        let todos = self.repository.find_by_due_date_before(now).await?;
        Ok(todos
            .into_iter()
            .filter(|todo| todo.is_overdue_at(now))
            .map(mapper::to_response)
            .collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn search(&self, keyword: &str) -> ServiceResult<Vec<TodoResponse>> {
        let todos = self.repository.search_by_keyword(keyword).await?;
        tracing::debug!(matches = todos.len(), "search finished");
        Ok(todos.into_iter().map(mapper::to_response).collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn toggle_status(&self, id: i64) -> ServiceResult<TodoResponse> {
        let saved = self
            .repository
            .modify(
                id,
                Box::new(|todo: &mut Todo| {
                    todo.completed = Some(!todo.completed.unwrap_or(false));
                }),
            )
            .await?;
        tracing::info!(id, completed = ?saved.completed, "todo toggled");
        Ok(mapper::to_response(saved))
    }

    /// Todos due inside the inclusive window `[start, end]`.
    #[tracing::instrument(skip(self))]
    pub async fn get_due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ServiceResult<Vec<TodoResponse>> {
        if start > end {
            return Err(ServiceError::invalid_field(
                "start",
                "start must not be after end",
            ));
        }
        let todos = self.repository.find_by_due_date_between(start, end).await?;
        Ok(todos.into_iter().map(mapper::to_response).collect())
    }
}
