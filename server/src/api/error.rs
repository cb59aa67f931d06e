//! Error responses for the HTTP surface.
//!
//! # Design
//! Handlers return `ApiError`, which renders the JSON body immediately and also
//! stashes itself in the response extensions. `render_errors` (installed on the
//! outermost router) re-renders that body with the full request path, so the
//! `path` field is correct even for routes nested under a base path.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

use crate::service::ServiceError;

/// Body of every non-2xx response produced by this API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    message: String,
    validation_errors: Option<BTreeMap<String, String>>,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: "Not Found",
            message: message.into(),
            validation_errors: None,
        }
    }

    pub fn validation(fields: BTreeMap<String, String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "Validation Failed",
            message: "Request validation failed".to_string(),
            validation_errors: Some(fields),
        }
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            error: "Method Not Allowed",
            message: message.into(),
            validation_errors: None,
        }
    }

    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "Internal Server Error",
            message: "An unexpected error occurred".to_string(),
            validation_errors: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self, path: impl Into<String>) -> ErrorResponse {
        ErrorResponse {
            timestamp: Utc::now(),
            status: self.status.as_u16(),
            error: self.error.to_string(),
            message: self.message.clone(),
            path: path.into(),
            validation_errors: self.validation_errors.clone(),
        }
    }

    fn render(self, path: impl Into<String>) -> Response {
        let body = self.body(path);
        let mut response = (self.status, Json(body)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::NotFound(_) => ApiError::not_found(error.to_string()),
            ServiceError::Validation(fields) => ApiError::validation(fields),
            ServiceError::Repository(source) => {
                tracing::error!(error = %source, "unexpected storage failure");
                ApiError::internal()
            }
        }
    }
}

impl From<ValidationErrors> for ApiError {
    /// Keeps the first message reported for each field.
    fn from(errors: ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, violations)| {
                let message = violations
                    .first()
                    .and_then(|v| v.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| "is invalid".to_string());
                (camel_case(&field), message)
            })
            .collect();
        ApiError::validation(fields)
    }
}

/// Field names in error bodies use the JSON spelling (`due_date` -> `dueDate`).
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(BTreeMap::from([(
            "body".to_string(),
            rejection.body_text(),
        )]))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.render(String::new())
    }
}

/// Fills in the request path of any `ApiError` body.
pub async fn render_errors(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;
    match response.extensions_mut().remove::<ApiError>() {
        Some(error) => error.render(path),
        None => response,
    }
}
