//! Full lifecycle test against the live server.
//!
//! # Design
//! Starts the server on a random port, then exercises every core client
//! operation over real HTTP using ureq. Validates that the core's request
//! building and response parsing agree with the actual server.

use chrono::{Duration, Utc};
use todo_core::{
    ApiError, CreateTodo, HttpMethod, HttpRequest, HttpResponse, Priority, TodoClient, UpdateTodo,
};

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the core
/// client handle status interpretation.
fn execute(req: HttpRequest) -> HttpResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let mut response = match (req.method, req.body) {
        (HttpMethod::Get, _) => agent.get(&req.path).call(),
        (HttpMethod::Delete, _) => agent.delete(&req.path).call(),
        (HttpMethod::Post, Some(body)) => {
            agent.post(&req.path).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Post, None) => agent.post(&req.path).send_empty(),
        (HttpMethod::Put, Some(body)) => {
            agent.put(&req.path).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Put, None) => agent.put(&req.path).send_empty(),
        (HttpMethod::Patch, Some(body)) => {
            agent.patch(&req.path).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Patch, None) => agent.patch(&req.path).send_empty(),
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();

    HttpResponse {
        status,
        body,
    }
}

/// Start a fresh in-memory server on a random port and return its API base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            todo_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}/api/v1")
}

#[test]
fn crud_lifecycle() {
    let client = TodoClient::new(&start_server());

    // List: should be empty.
    let todos = client.parse_todo_list(execute(client.build_list_todos())).unwrap();
    assert!(todos.is_empty(), "expected empty list");

    // Create with only a title: server fills the defaults.
    let create_input = CreateTodo {
        title: "Integration test".to_string(),
        ..Default::default()
    };
    let req = client.build_create_todo(&create_input).unwrap();
    let created = client.parse_create_todo(execute(req)).unwrap();
    assert_eq!(created.title, "Integration test");
    assert!(!created.completed);
    assert_eq!(created.priority, Priority::Medium);
    let id = created.id;

    // Get the created todo.
    let fetched = client.parse_todo(execute(client.build_get_todo(id))).unwrap();
    assert_eq!(fetched, created);

    // Partial update: title only.
    let update_input = UpdateTodo {
        title: Some("Updated title".to_string()),
        ..Default::default()
    };
    let req = client.build_update_todo(id, &update_input).unwrap();
    let updated = client.parse_todo(execute(req)).unwrap();
    assert_eq!(updated.title, "Updated title");
    assert!(!updated.completed);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);

    // Toggle flips completion.
    let toggled = client.parse_todo(execute(client.build_toggle_todo(id))).unwrap();
    assert!(toggled.completed);
    let done = client
        .parse_todo_list(execute(client.build_todos_by_status(true)))
        .unwrap();
    assert_eq!(done.len(), 1);

    // Delete.
    client.parse_delete_todo(execute(client.build_delete_todo(id))).unwrap();

    // Get after delete: NotFound with the server's message.
    let err = client.parse_todo(execute(client.build_get_todo(id))).unwrap_err();
    assert!(
        matches!(err, ApiError::NotFound(ref m) if m == &format!("Todo not found with id: {id}")),
        "unexpected error: {err:?}"
    );

    // Delete again: NotFound.
    let err = client.parse_delete_todo(execute(client.build_delete_todo(id))).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    // List: empty again.
    let todos = client.parse_todo_list(execute(client.build_list_todos())).unwrap();
    assert!(todos.is_empty(), "expected empty list after delete");
}

#[test]
fn filters_and_queries() {
    let client = TodoClient::new(&start_server());
    let now = Utc::now();

    let inputs = [
        CreateTodo {
            title: "Pay rent".to_string(),
            priority: Some(Priority::Urgent),
            due_date: Some(now - Duration::days(2)),
            ..Default::default()
        },
        CreateTodo {
            title: "Buy bread".to_string(),
            description: Some("Sourdough from the market".to_string()),
            priority: Some(Priority::Low),
            due_date: Some(now + Duration::days(3)),
        },
        CreateTodo {
            title: "Call mom".to_string(),
            ..Default::default()
        },
    ];
    for input in &inputs {
        let req = client.build_create_todo(input).unwrap();
        client.parse_create_todo(execute(req)).unwrap();
    }

    let urgent = client
        .parse_todo_list(execute(client.build_todos_by_priority(Priority::Urgent)))
        .unwrap();
    assert_eq!(urgent.len(), 1);
    assert_eq!(urgent[0].title, "Pay rent");

    let overdue = client
        .parse_todo_list(execute(client.build_overdue_todos()))
        .unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].title, "Pay rent");

    let req = client.build_search_todos("SOURDOUGH").unwrap();
    let found = client.parse_todo_list(execute(req)).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Buy bread");

    let req = client
        .build_todos_due_between(now - Duration::days(7), now + Duration::days(7))
        .unwrap();
    let due = client.parse_todo_list(execute(req)).unwrap();
    assert_eq!(due.len(), 2);

    let open = client
        .parse_todo_list(execute(client.build_todos_by_status(false)))
        .unwrap();
    assert_eq!(open.len(), 3);
}

#[test]
fn validation_errors_surface_field_messages() {
    let client = TodoClient::new(&start_server());

    let input = CreateTodo {
        title: "   ".to_string(),
        ..Default::default()
    };
    let req = client.build_create_todo(&input).unwrap();
    let err = client.parse_create_todo(execute(req)).unwrap_err();
    match err {
        ApiError::Validation { fields, .. } => assert!(fields.contains_key("title")),
        other => panic!("expected validation error, got {other:?}"),
    }
}
