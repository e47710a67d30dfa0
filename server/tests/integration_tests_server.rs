use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, NaiveDate};
use http_body_util::BodyExt; // For `collect`
use serde_json::{Value, json};
use sqlx::sqlite::SqlitePoolOptions;
use taskflow_server::database;
use taskflow_server::routes::create_router;
use taskflow_server::state::AppState;
use tower::ServiceExt; // For `oneshot`

/// Helper function to set up the router over a fresh, in-memory database.
async fn setup_app() -> Router {
    // One connection, so every request sees the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory SQLite");

    database::init_schema(&pool)
        .await
        .expect("Failed to create schema in test DB");

    create_router(AppState::new(pool, Duration::days(7)))
}

/// Sends one request and returns the status with the parsed JSON body
/// (`Value::Null` for an empty body).
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Registers a user and returns a session token for it.
async fn login_as(app: &Router, username: &str) -> String {
    let email = format!("{}@example.com", username);
    let (status, _) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": username, "email": email, "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn create_todo(app: &Router, token: &str, body: Value) -> Value {
    let (status, task) = send(app, "POST", "/api/todos", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{task}");
    task
}

#[tokio::test]
async fn test_health() {
    let app = setup_app().await;

    for uri in ["/health", "/api/health"] {
        let (status, body) = send(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}

#[tokio::test]
async fn test_requests_without_valid_token_are_unauthorized() {
    let app = setup_app().await;

    // No token at all
    let (status, body) = send(&app, "GET", "/api/todos", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
    assert!(body["error"].is_string());

    // A token nobody issued
    let (status, _) = send(&app, "GET", "/api/notes", Some("made-up"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = setup_app().await;
    let token = login_as(&app, "alice").await;

    let (status, _) = send(&app, "GET", "/api/todos", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "POST", "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/api/todos", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = setup_app().await;
    login_as(&app, "alice").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "nope-nope" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_todo_crud() {
    // Arrange
    let app = setup_app().await;
    let token = login_as(&app, "alice").await;

    // Act: create
    let task = create_todo(
        &app,
        &token,
        json!({ "title": "Write report", "priority": "high", "dueDate": "2025-06-11" }),
    )
    .await;
    let id = task["id"].as_str().unwrap().to_string();
    assert_eq!(task["status"], "pending");
    assert_eq!(task["category"], "Uncategorized");
    assert_eq!(task["due_date"], "2025-06-11");

    // Act: partial update keeps untouched fields
    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/todos/{}", id),
        Some(&token),
        Some(json!({ "title": "Write final report" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Write final report");
    assert_eq!(updated["priority"], "high");

    // Act: list
    let (status, page) = send(&app, "GET", "/api/todos?priority=high", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["todos"][0]["id"], id.as_str());

    // Act: delete
    let (status, body) = send(&app, "DELETE", &format!("/api/todos/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    // Assert: gone
    let (status, body) = send(&app, "GET", &format!("/api/todos/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn test_todo_validation_and_paging_errors() {
    let app = setup_app().await;
    let token = login_as(&app, "alice").await;

    let (status, _) = send(&app, "POST", "/api/todos", Some(&token), Some(json!({ "title": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/api/todos?limit=0", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    let (status, _) = send(&app, "POST", "/api/todos", Some(&token), Some(json!({ "nope": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_and_subtask_transitions() {
    let app = setup_app().await;
    let token = login_as(&app, "alice").await;
    let task = create_todo(
        &app,
        &token,
        json!({ "title": "Move house", "subtasks": [{ "title": "pack" }, { "title": "drive" }] }),
    )
    .await;
    let id = task["id"].as_str().unwrap();
    let first = task["subtasks"][0]["id"].as_str().unwrap();

    // One of two subtasks done: in progress
    let (status, toggled) = send(
        &app,
        "PATCH",
        &format!("/api/todos/{}/subtasks/{}/toggle", id, first),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["status"], "in_progress");
    assert_eq!(toggled["completed"], false);

    // Completing the task completes every subtask
    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/todos/{}/toggle-complete", id),
        Some(&token),
        Some(json!({ "completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completed"], true);
    assert!(body["updated_at"].is_string());

    // Back to pending reopens them
    let (status, pending) = send(
        &app,
        "PATCH",
        &format!("/api/todos/{}/status", id),
        Some(&token),
        Some(json!({ "status": "pending" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending["completed"], false);
    assert!(
        pending["subtasks"]
            .as_array()
            .unwrap()
            .iter()
            .all(|st| st["completed"] == false)
    );
}

#[tokio::test]
async fn test_put_completion_change_carries_subtasks() {
    let app = setup_app().await;
    let token = login_as(&app, "alice").await;
    let task = create_todo(
        &app,
        &token,
        json!({
            "title": "Pack",
            "subtasks": [{ "title": "books", "completed": true }, { "title": "plates", "completed": true }]
        }),
    )
    .await;
    assert_eq!(task["status"], "completed");
    let uri = format!("/api/todos/{}", task["id"].as_str().unwrap());

    let (status, body) = send(&app, "PUT", &uri, Some(&token), Some(json!({ "status": "in_progress" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, reopened) = send(&app, "PUT", &uri, Some(&token), Some(json!({ "completed": false }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reopened["completed"], false);
    assert_eq!(reopened["status"], "pending");
    assert!(
        reopened["subtasks"]
            .as_array()
            .unwrap()
            .iter()
            .all(|st| st["completed"] == false)
    );

    let (_, stored) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(stored["status"], "pending");
}

#[tokio::test]
async fn test_group_and_bulk_delete() {
    let app = setup_app().await;
    let token = login_as(&app, "alice").await;
    let mut ids = Vec::new();
    for title in ["a", "b", "c"] {
        let task = create_todo(&app, &token, json!({ "title": title })).await;
        ids.push(task["id"].as_str().unwrap().to_string());
    }

    // Fewer than two tasks is rejected
    let (status, _) = send(&app, "POST", "/api/todos/group", Some(&token), Some(json!({ "ids": [ids[0]] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Grouping two leaves one combined task plus the third
    let (status, grouped) = send(
        &app,
        "POST",
        "/api/todos/group",
        Some(&token),
        Some(json!({ "ids": [ids[0], ids[1]] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(grouped["description"].as_str().unwrap().contains("- a"));

    let (_, page) = send(&app, "GET", "/api/todos", Some(&token), None).await;
    assert_eq!(page["total"], 2);

    let grouped_id = grouped["id"].as_str().unwrap();
    let (status, body) = send(
        &app,
        "POST",
        "/api/todos/bulk-delete",
        Some(&token),
        Some(json!({ "ids": [grouped_id, ids[2], "unknown"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 2);
}

#[tokio::test]
async fn test_lists_enforce_category_integrity() {
    let app = setup_app().await;
    let token = login_as(&app, "alice").await;

    // Unknown category is rejected
    let (status, _) = send(
        &app,
        "POST",
        "/api/todos",
        Some(&token),
        Some(json!({ "title": "report", "category": "Work" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, list) = send(&app, "POST", "/api/lists", Some(&token), Some(json!({ "name": "Work" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(list["color"], "#2c5282");

    let (status, _) = send(&app, "POST", "/api/lists", Some(&token), Some(json!({ "name": "Work" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let task = create_todo(&app, &token, json!({ "title": "report", "category": "Work" })).await;

    // Deleting the list relabels its tasks
    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/lists/{}", list["id"].as_str().unwrap()),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["relabeled"], 1);

    let (_, task) = send(
        &app,
        "GET",
        &format!("/api/todos/{}", task["id"].as_str().unwrap()),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(task["category"], "Uncategorized");
}

#[tokio::test]
async fn test_default_tags() {
    let app = setup_app().await;
    let token = login_as(&app, "alice").await;

    let (status, tags) = send(&app, "GET", "/api/tags", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = tags
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Tag 1", "Tag 2"]);
}

#[tokio::test]
async fn test_calendar_day_view() {
    let app = setup_app().await;
    let token = login_as(&app, "alice").await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/events",
        Some(&token),
        Some(json!({ "title": "standup", "startTime": "10:30", "endTime": "11:30", "date": "2025-03-05" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        "POST",
        "/api/events",
        Some(&token),
        Some(json!({ "title": "broken", "startTime": "25:00", "date": "2025-03-05" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, day) = send(&app, "GET", "/api/calendar/day?date=2025-03-05", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(day["label"], "5 March 2025");
    assert_eq!(day["events"][0]["title"], "standup");
    assert_eq!(day["events"][0]["top"], 90.0);
    assert_eq!(day["events"][0]["height"], 60.0);

    let (_, week) = send(&app, "GET", "/api/calendar/week?date=2025-03-05", Some(&token), None).await;
    assert_eq!(week["days"][0]["date"], "2025-03-03");

    let (_, events) = send(&app, "GET", "/api/events?date=2025-03-06", Some(&token), None).await;
    assert_eq!(events.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_calendar_at_last_supported_date() {
    let app = setup_app().await;
    let token = login_as(&app, "alice").await;
    let last = NaiveDate::MAX.to_string().replace('+', "%2B");

    // The week around the last day runs past the date range.
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/calendar/week?date={}", last),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    for path in ["/api/calendar/day", "/api/calendar/month", "/api/todos/upcoming"] {
        let (status, body) = send(&app, "GET", &format!("{}?date={}", path, last), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK, "{path}: {body}");
    }
}

#[tokio::test]
async fn test_notes_move() {
    let app = setup_app().await;
    let token = login_as(&app, "alice").await;
    let mut ids = Vec::new();
    for title in ["a", "b", "c"] {
        let (status, note) = send(&app, "POST", "/api/notes", Some(&token), Some(json!({ "title": title }))).await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(note["id"].as_str().unwrap().to_string());
    }

    let (status, board) = send(
        &app,
        "POST",
        &format!("/api/notes/{}/move", ids[0]),
        Some(&token),
        Some(json!({ "index": 99 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = board
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["b", "c", "a"]);
}

#[tokio::test]
async fn test_workspaces_are_isolated_per_user() {
    let app = setup_app().await;
    let alice = login_as(&app, "alice").await;
    let bob = login_as(&app, "bob").await;
    let task = create_todo(&app, &alice, json!({ "title": "private" })).await;

    let (_, page) = send(&app, "GET", "/api/todos", Some(&bob), None).await;
    assert_eq!(page["total"], 0);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/todos/{}", task["id"].as_str().unwrap()),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stats_and_upcoming() {
    let app = setup_app().await;
    let token = login_as(&app, "alice").await;
    create_todo(&app, &token, json!({ "title": "tomorrow", "due_date": "2025-06-11" })).await;
    create_todo(&app, &token, json!({ "title": "later", "due_date": "2025-06-15" })).await;
    create_todo(&app, &token, json!({ "title": "done", "completed": true, "due_date": "2025-06-11" })).await;

    let (status, upcoming) = send(&app, "GET", "/api/todos/upcoming?date=2025-06-10", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(upcoming["tomorrow"].as_array().unwrap().len(), 1);
    assert_eq!(upcoming["this_week"].as_array().unwrap().len(), 1);

    let (status, stats) = send(&app, "GET", "/api/stats?date=2025-06-10", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["completed"], 1);
}
