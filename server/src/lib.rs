//! Todo REST service.
//!
//! # Overview
//! Create, read, update, delete, filter, search and toggle todo items over
//! HTTP/JSON. Layers, leaf first: `model` (record and request/response
//! shapes), `mapper` (pure conversions), `repository` (storage trait with
//! in-memory and SQLite backends), `service` (one method per use case) and
//! `api` (axum routes and error rendering).

pub mod api;
pub mod config;
pub mod mapper;
pub mod model;
pub mod repository;
pub mod service;

use std::sync::Arc;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use api::AppState;
use repository::InMemoryTodoRepository;
use service::TodoService;

pub use config::{ServerConfig, StorageConfig, DEFAULT_BASE_PATH};
pub use model::{CreateTodoRequest, Priority, Todo, TodoResponse, UpdateTodoRequest};

/// Router mounted under `base_path` (`""` for the root) with error
/// rendering, request tracing and permissive CORS. Unknown paths and
/// unsupported methods answer with the same JSON error body as handlers.
pub fn router(service: TodoService, base_path: &str) -> Router {
    let routes = api::routes().with_state(AppState::new(service));
    let app = if base_path.is_empty() {
        routes
    } else {
        Router::new().nest(base_path, routes)
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    app.fallback(api::handlers::route_not_found)
        .layer(middleware::from_fn(api::render_errors))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Router over `service` at the default base path.
pub fn app(service: TodoService) -> Router {
    router(service, DEFAULT_BASE_PATH)
}

/// Fresh in-memory service at the default base path.
pub fn in_memory_app() -> Router {
    app(TodoService::new(Arc::new(InMemoryTodoRepository::new())))
}

/// Serves a fresh in-memory instance on `listener` until the process ends.
pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, in_memory_app()).await
}
