//! Translation between the persisted `Todo` and the API request/response shapes.
//!
//! Every function here is pure. Fields the store owns (`id`, timestamps) are
//! never written from request data.

use crate::model::{CreateTodoRequest, Todo, TodoResponse, UpdateTodoRequest};

/// Field-for-field copy of a record into its response shape.
pub fn to_response(todo: Todo) -> TodoResponse {
    TodoResponse {
        id: todo.id,
        title: todo.title,
        description: todo.description,
        completed: todo.completed,
        priority: todo.priority,
        due_date: todo.due_date,
        created_at: todo.created_at,
        updated_at: todo.updated_at,
    }
}

/// Absent record in, absent response out.
pub fn to_response_opt(todo: Option<Todo>) -> Option<TodoResponse> {
    todo.map(to_response)
}

/// Builds an unsaved record. `completed` is left unset along with the
/// store-owned fields; the service fills defaults.
pub fn to_record(request: CreateTodoRequest) -> Todo {
    Todo {
        id: None,
        title: request.title,
        description: request.description,
        completed: None,
        priority: request.priority,
        due_date: request.due_date,
        created_at: None,
        updated_at: None,
    }
}

/// Overwrites each field of `todo` for which `request` carries a value.
pub fn apply_update(request: UpdateTodoRequest, todo: &mut Todo) {
    if let Some(title) = request.title {
        todo.title = title;
    }
    if let Some(description) = request.description {
        todo.description = Some(description);
    }
    if let Some(completed) = request.completed {
        todo.completed = Some(completed);
    }
    if let Some(priority) = request.priority {
        todo.priority = Some(priority);
    }
    if let Some(due_date) = request.due_date {
        todo.due_date = Some(due_date);
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::model::Priority;

    fn stored() -> Todo {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        Todo {
            id: Some(7),
            title: "Write report".to_string(),
            description: Some("quarterly numbers".to_string()),
            completed: Some(false),
            priority: Some(Priority::Low),
            due_date: Some(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()),
            created_at: Some(at),
            updated_at: Some(at),
        }
    }

    #[test]
    fn to_response_copies_every_field() {
        let todo = stored();
        let response = to_response(todo.clone());
        assert_eq!(response.id, todo.id);
        assert_eq!(response.title, todo.title);
        assert_eq!(response.description, todo.description);
        assert_eq!(response.completed, todo.completed);
        assert_eq!(response.priority, todo.priority);
        assert_eq!(response.due_date, todo.due_date);
        assert_eq!(response.created_at, todo.created_at);
        assert_eq!(response.updated_at, todo.updated_at);
    }

    #[test]
    fn to_response_opt_propagates_absence() {
        assert!(to_response_opt(None).is_none());
        assert_eq!(to_response_opt(Some(stored())).unwrap().id, Some(7));
    }

    #[test]
    fn to_record_leaves_store_fields_and_completed_unset() {
        let request = CreateTodoRequest {
            title: "Buy milk".to_string(),
            description: Some("2 litres".to_string()),
            priority: Some(Priority::High),
            due_date: None,
        };
        let todo = to_record(request);
        assert_eq!(todo.title, "Buy milk");
        assert_eq!(todo.description.as_deref(), Some("2 litres"));
        assert_eq!(todo.priority, Some(Priority::High));
        assert!(todo.id.is_none());
        assert!(todo.completed.is_none());
        assert!(todo.created_at.is_none());
        assert!(todo.updated_at.is_none());
    }

    #[test]
    fn apply_update_with_empty_request_changes_nothing() {
        let mut todo = stored();
        apply_update(UpdateTodoRequest::default(), &mut todo);
        assert_eq!(todo, stored());
    }

    #[test]
    fn apply_update_overwrites_only_present_fields() {
        let mut todo = stored();
        apply_update(
            UpdateTodoRequest {
                completed: Some(true),
                priority: Some(Priority::Urgent),
                ..Default::default()
            },
            &mut todo,
        );
        assert_eq!(todo.completed, Some(true));
        assert_eq!(todo.priority, Some(Priority::Urgent));
        assert_eq!(todo.title, "Write report");
        assert_eq!(todo.description.as_deref(), Some("quarterly numbers"));
        assert_eq!(todo.due_date, stored().due_date);
        assert_eq!(todo.id, Some(7));
    }
}
