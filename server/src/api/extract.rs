//! Request extractors and path/query parsers that fail with `ApiError`.

use axum::extract::{FromRequest, Request};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use validator::Validate;

use super::error::ApiError;
use crate::model::Priority;
use crate::service::ServiceError;

/// JSON body that has been deserialized and passed its `validator` rules.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

pub fn parse_id(raw: &str) -> Result<i64, ServiceError> {
    raw.parse()
        .map_err(|_| ServiceError::invalid_field("id", format!("{raw:?} is not a valid todo id")))
}

/// Only the literals `true` and `false` are accepted.
pub fn parse_completed(raw: &str) -> Result<bool, ServiceError> {
    match raw {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ServiceError::invalid_field(
            "completed",
            format!("must be true or false (got {other:?})"),
        )),
    }
}

pub fn parse_priority(raw: &str) -> Result<Priority, ServiceError> {
    raw.parse::<Priority>()
        .map_err(|e| ServiceError::invalid_field("priority", e.to_string()))
}

/// Parses a required RFC 3339 query parameter.
pub fn parse_instant(field: &str, raw: Option<&str>) -> Result<DateTime<Utc>, ServiceError> {
    let raw = raw.ok_or_else(|| ServiceError::invalid_field(field, "is required"))?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ServiceError::invalid_field(field, format!("not an RFC 3339 timestamp: {e}")))
}
