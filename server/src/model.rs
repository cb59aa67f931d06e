//! Record model and request/response shapes for the todo API.
//!
//! # Design
//! `Todo` is the persisted row. `id`, `created_at` and `updated_at` stay
//! `None` until a repository stores the record; after that they are always
//! populated. Request types carry `validator` rules and are checked by the
//! HTTP layer before reaching the service. JSON uses camelCase field names.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Priority level of a todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Urgent => "URGENT",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the four priority literals.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("must be one of LOW, MEDIUM, HIGH, URGENT (got {0:?})")]
pub struct InvalidPriority(pub String);

impl FromStr for Priority {
    type Err = InvalidPriority;

    /// Strict: only the exact upper-case literals are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| InvalidPriority(s.to_string()))
    }
}

/// A todo row as held by a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Todo {
    /// Overdue means incomplete with a due date strictly before `now`.
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        !self.completed.unwrap_or(false) && self.due_date.is_some_and(|due| due < now)
    }

    /// Case-insensitive substring match against title or description.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }
}

/// Todo as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request payload for creating a todo.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    /// A missing title deserializes as empty and fails validation as blank.
    #[validate(
        custom(function = "not_blank"),
        length(min = 1, max = 200, message = "Title must be between 1 and 200 characters")
    )]
    #[serde(default)]
    pub title: String,

    #[validate(length(max = 1000, message = "Description must not exceed 1000 characters"))]
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub priority: Option<Priority>,

    #[validate(custom(function = "four_digit_year"))]
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Request payload for updating a todo. Only present fields are applied;
/// `null` is treated the same as an omitted field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    #[validate(
        custom(function = "not_blank"),
        length(min = 1, max = 200, message = "Title must be between 1 and 200 characters")
    )]
    #[serde(default)]
    pub title: Option<String>,

    #[validate(length(max = 1000, message = "Description must not exceed 1000 characters"))]
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub completed: Option<bool>,

    #[serde(default)]
    pub priority: Option<Priority>,

    #[validate(custom(function = "four_digit_year"))]
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("Title cannot be blank".into());
        return Err(error);
    }
    Ok(())
}

/// Years outside 0000..=9999 do not format to fixed-width RFC 3339 text.
pub fn has_four_digit_year(instant: &DateTime<Utc>) -> bool {
    (0..=9999).contains(&instant.year())
}

fn four_digit_year(value: &DateTime<Utc>) -> Result<(), ValidationError> {
    if !has_four_digit_year(value) {
        let mut error = ValidationError::new("year_range");
        error.message = Some("Due date year must be between 0000 and 9999".into());
        return Err(error);
    }
    Ok(())
}
