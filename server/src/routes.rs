// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::handlers::{self, auth, calendar, lists, notes, todos};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};
use tower_http::trace::TraceLayer;

/// Creates and configures the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/health", get(handlers::health))
        // Accounts and sessions
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        // Tasks
        .route("/api/todos", get(todos::list_todos).post(todos::create_todo))
        .route("/api/todos/upcoming", get(todos::upcoming))
        .route("/api/todos/group", post(todos::group_todos))
        .route("/api/todos/bulk-delete", post(todos::bulk_delete))
        .route(
            "/api/todos/{id}",
            get(todos::get_todo)
                .put(todos::update_todo)
                .delete(todos::delete_todo),
        )
        .route(
            "/api/todos/{id}/toggle-complete",
            patch(todos::toggle_complete),
        )
        .route("/api/todos/{id}/status", patch(todos::set_status))
        .route(
            "/api/todos/{id}/subtasks/{subtask_id}/toggle",
            patch(todos::toggle_subtask),
        )
        .route("/api/stats", get(todos::stats))
        // Lists and tags
        .route("/api/lists", get(lists::list_lists).post(lists::create_list))
        .route("/api/lists/{id}", delete(lists::delete_list))
        .route("/api/tags", get(lists::list_tags).post(lists::create_tag))
        .route("/api/tags/{id}", delete(lists::delete_tag))
        // Calendar
        .route(
            "/api/events",
            get(calendar::list_events).post(calendar::create_event),
        )
        .route(
            "/api/events/{id}",
            put(calendar::update_event).delete(calendar::delete_event),
        )
        .route("/api/calendar/day", get(calendar::day_view))
        .route("/api/calendar/week", get(calendar::week_view))
        .route("/api/calendar/month", get(calendar::month_view))
        // Sticky notes
        .route("/api/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/api/notes/{id}",
            put(notes::update_note).delete(notes::delete_note),
        )
        .route("/api/notes/{id}/move", post(notes::move_note))
        .layer(TraceLayer::new_for_http())
        // Adds the shared state (pool, session settings, locks) to the application
        .with_state(state)
}
