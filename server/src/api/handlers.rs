use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode, Uri};
use axum::Json;
use serde::Deserialize;

use super::error::ApiError;
use super::extract::{parse_completed, parse_id, parse_instant, parse_priority, ValidatedJson};
use super::AppState;
use crate::model::{CreateTodoRequest, TodoResponse, UpdateTodoRequest};
use crate::service::ServiceError;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub keyword: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DueWindowParams {
    pub start: Option<String>,
    pub end: Option<String>,
}

pub async fn create_todo(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateTodoRequest>,
) -> ApiResult<(StatusCode, Json<TodoResponse>)> {
    let created = state.todos.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_todos(State(state): State<AppState>) -> ApiResult<Json<Vec<TodoResponse>>> {
    Ok(Json(state.todos.get_all().await?))
}

pub async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TodoResponse>> {
    let id = parse_id(&id)?;
    Ok(Json(state.todos.get_by_id(id).await?))
}

pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<UpdateTodoRequest>,
) -> ApiResult<Json<TodoResponse>> {
    let id = parse_id(&id)?;
    Ok(Json(state.todos.update(id, input).await?))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    state.todos.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn todos_by_status(
    State(state): State<AppState>,
    Path(completed): Path<String>,
) -> ApiResult<Json<Vec<TodoResponse>>> {
    let completed = parse_completed(&completed)?;
    Ok(Json(state.todos.get_by_status(completed).await?))
}

pub async fn todos_by_priority(
    State(state): State<AppState>,
    Path(priority): Path<String>,
) -> ApiResult<Json<Vec<TodoResponse>>> {
    let priority = parse_priority(&priority)?;
    Ok(Json(state.todos.get_by_priority(priority).await?))
}

pub async fn overdue_todos(State(state): State<AppState>) -> ApiResult<Json<Vec<TodoResponse>>> {
    Ok(Json(state.todos.get_overdue().await?))
}

pub async fn search_todos(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<TodoResponse>>> {
    let keyword = params
        .keyword
        .ok_or_else(|| ServiceError::invalid_field("keyword", "is required"))?;
    Ok(Json(state.todos.search(&keyword).await?))
}

pub async fn toggle_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TodoResponse>> {
    let id = parse_id(&id)?;
    Ok(Json(state.todos.toggle_status(id).await?))
}

pub async fn todos_due_between(
    State(state): State<AppState>,
    Query(params): Query<DueWindowParams>,
) -> ApiResult<Json<Vec<TodoResponse>>> {
    let start = parse_instant("start", params.start.as_deref())?;
    let end = parse_instant("end", params.end.as_deref())?;
    Ok(Json(state.todos.get_due_between(start, end).await?))
}

/// Fallback for paths no route matches.
pub async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}

/// Fallback for a known path requested with an unsupported method.
pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::method_not_allowed(format!("Request method '{method}' is not supported"))
}
