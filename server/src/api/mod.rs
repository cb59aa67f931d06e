//! HTTP surface: routes, handlers and error rendering.

pub mod error;
pub mod extract;
pub mod handlers;

use axum::routing::{get, patch};
use axum::Router;

use crate::service::TodoService;

pub use error::{render_errors, ApiError, ErrorResponse};

#[derive(Clone)]
pub struct AppState {
    pub todos: TodoService,
}

impl AppState {
    pub fn new(todos: TodoService) -> Self {
        Self { todos }
    }
}

/// Todo routes, relative to the API base path.
pub fn routes() -> Router<AppState> {
    use handlers::*;

    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/overdue", get(overdue_todos))
        .route("/todos/search", get(search_todos))
        .route("/todos/due", get(todos_due_between))
        .route("/todos/status/{completed}", get(todos_by_status))
        .route("/todos/priority/{priority}", get(todos_by_priority))
        .route(
            "/todos/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .route("/todos/{id}/toggle", patch(toggle_todo))
        .method_not_allowed_fallback(method_not_allowed)
}
