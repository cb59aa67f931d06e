//! Error types for the todo API client.
//!
//! `NotFound` and `Validation` get dedicated variants because callers act on
//! them; every other non-success status lands in `HttpError` with the raw body.

use std::collections::BTreeMap;

use thiserror::Error;

/// Errors returned by `TodoClient` build and parse methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The server returned 400. `fields` maps field name to violation.
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        fields: BTreeMap<String, String>,
    },

    /// Any other unexpected status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    #[error("serialization failed: {0}")]
    SerializationError(String),
}
