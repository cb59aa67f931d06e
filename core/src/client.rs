//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes the `HttpResponse`.
//! All list endpoints share `parse_todo_list`; single-todo endpoints answering
//! 200 share `parse_todo`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateTodo, ErrorBody, Priority, Todo, UpdateTodo};

/// Synchronous, stateless client for the todo API.
///
/// `base_url` includes the API prefix, e.g. `http://localhost:3000/api/v1`.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    fn json_request<T: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        input: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        let mut request = self.request(method, path);
        request
            .headers
            .push(("content-type".to_string(), "application/json".to_string()));
        request.body = Some(body);
        Ok(request)
    }

    fn query_request<T: Serialize>(&self, path: &str, query: &T) -> Result<HttpRequest, ApiError> {
        let query = serde_urlencoded::to_string(query)
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(self.request(HttpMethod::Get, &format!("{path}?{query}")))
    }

    pub fn build_list_todos(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/todos")
    }

    pub fn build_get_todo(&self, id: i64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/todos/{id}"))
    }

    pub fn build_create_todo(&self, input: &CreateTodo) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/todos", input)
    }

    pub fn build_update_todo(&self, id: i64, input: &UpdateTodo) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("/todos/{id}"), input)
    }

    pub fn build_delete_todo(&self, id: i64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/todos/{id}"))
    }

    pub fn build_todos_by_status(&self, completed: bool) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/todos/status/{completed}"))
    }

    pub fn build_todos_by_priority(&self, priority: Priority) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            &format!("/todos/priority/{}", priority.as_str()),
        )
    }

    pub fn build_overdue_todos(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/todos/overdue")
    }

    pub fn build_search_todos(&self, keyword: &str) -> Result<HttpRequest, ApiError> {
        self.query_request("/todos/search", &[("keyword", keyword)])
    }

    pub fn build_toggle_todo(&self, id: i64) -> HttpRequest {
        self.request(HttpMethod::Patch, &format!("/todos/{id}/toggle"))
    }

    pub fn build_todos_due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<HttpRequest, ApiError> {
        let start = start.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        let end = end.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        self.query_request("/todos/due", &[("start", start), ("end", end)])
    }

    /// Parses any endpoint that answers with a list of todos.
    pub fn parse_todo_list(&self, response: HttpResponse) -> Result<Vec<Todo>, ApiError> {
        check_status(&response, 200)?;
        decode(&response.body)
    }

    /// Parses get, update and toggle responses.
    pub fn parse_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, 200)?;
        decode(&response.body)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, 201)?;
        decode(&response.body)
    }

    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    let body: Option<ErrorBody> = serde_json::from_str(&response.body).ok();
    match (response.status, body) {
        (404, body) => Err(ApiError::NotFound(
            body.map(|b| b.message).unwrap_or_else(|| response.body.clone()),
        )),
        (400, Some(body)) => Err(ApiError::Validation {
            message: body.message,
            fields: body.validation_errors.unwrap_or_default(),
        }),
        _ => Err(ApiError::HttpError {
            status: response.status,
            body: response.body.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const TODO_JSON: &str = r#"{"id":1,"title":"Test","description":null,"completed":false,"priority":"MEDIUM","dueDate":null,"createdAt":"2025-01-01T00:00:00Z","updatedAt":"2025-01-01T00:00:00Z"}"#;

    fn client() -> TodoClient {
        TodoClient::new("http://localhost:3000/api/v1")
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn build_list_todos_produces_correct_request() {
        let req = client().build_list_todos();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/api/v1/todos");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_create_todo_omits_unset_fields() {
        let input = CreateTodo {
            title: "Buy milk".to_string(),
            ..Default::default()
        };
        let req = client().build_create_todo(&input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({ "title": "Buy milk" }));
    }

    #[test]
    fn build_update_todo_sends_only_present_fields() {
        let input = UpdateTodo {
            priority: Some(Priority::Urgent),
            ..Default::default()
        };
        let req = client().build_update_todo(4, &input).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "http://localhost:3000/api/v1/todos/4");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({ "priority": "URGENT" }));
    }

    #[test]
    fn filter_requests_use_literal_path_segments() {
        let c = client();
        assert!(c.build_todos_by_status(true).path.ends_with("/todos/status/true"));
        assert!(c
            .build_todos_by_priority(Priority::High)
            .path
            .ends_with("/todos/priority/HIGH"));
        assert!(c.build_overdue_todos().path.ends_with("/todos/overdue"));
    }

    #[test]
    fn build_toggle_todo_uses_patch() {
        let req = client().build_toggle_todo(9);
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.path, "http://localhost:3000/api/v1/todos/9/toggle");
    }

    #[test]
    fn build_search_encodes_keyword() {
        let req = client().build_search_todos("bread & butter").unwrap();
        assert_eq!(
            req.path,
            "http://localhost:3000/api/v1/todos/search?keyword=bread+%26+butter"
        );
    }

    #[test]
    fn build_due_between_encodes_rfc3339() {
        let start = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2030, 1, 31, 0, 0, 0).unwrap();
        let req = client().build_todos_due_between(start, end).unwrap();
        assert_eq!(
            req.path,
            "http://localhost:3000/api/v1/todos/due?start=2030-01-01T00%3A00%3A00Z&end=2030-01-31T00%3A00%3A00Z"
        );
    }

    #[test]
    fn parse_todo_list_success() {
        let todos = client()
            .parse_todo_list(response(200, &format!("[{TODO_JSON}]")))
            .unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "Test");
        assert_eq!(todos[0].priority, Priority::Medium);
    }

    #[test]
    fn parse_todo_not_found_carries_server_message() {
        let body = r#"{"timestamp":"2025-01-01T00:00:00Z","status":404,"error":"Not Found","message":"Todo not found with id: 5","path":"/api/v1/todos/5"}"#;
        let err = client().parse_todo(response(404, body)).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Todo not found with id: 5"));
    }

    #[test]
    fn parse_create_todo_validation_error() {
        let body = r#"{"timestamp":"2025-01-01T00:00:00Z","status":400,"error":"Validation Failed","message":"Request validation failed","path":"/api/v1/todos","validationErrors":{"title":"Title cannot be blank"}}"#;
        let err = client().parse_create_todo(response(400, body)).unwrap_err();
        match err {
            ApiError::Validation { fields, .. } => {
                assert_eq!(fields.get("title").map(String::as_str), Some("Title cannot be blank"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn parse_create_todo_wrong_status() {
        let err = client()
            .parse_create_todo(response(500, "internal error"))
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 500, .. }));
    }

    #[test]
    fn parse_delete_todo_success() {
        assert!(client().parse_delete_todo(response(204, "")).is_ok());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = TodoClient::new("http://localhost:3000/api/v1/");
        assert_eq!(client.build_list_todos().path, "http://localhost:3000/api/v1/todos");
    }

    #[test]
    fn parse_todo_list_bad_json() {
        let err = client()
            .parse_todo_list(response(200, "not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }
}
