// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use taskflow_common::filter::{TaskFilter, TaskSort, UpcomingTasks};
use taskflow_common::stats::TaskStats;
use taskflow_common::{Priority, Task, TaskDraft, TaskPatch, TaskStatus};
use tracing::{debug, info};

use super::{AppError, AppJson, AppPath, AppQuery};
use crate::auth::AuthUser;
use crate::state::AppState;

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Deserialize, Debug, Default)]
pub struct ListQuery {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub sort: Option<TaskSort>,
}

impl ListQuery {
    fn filter(&self) -> TaskFilter {
        TaskFilter {
            category: self.category.clone(),
            tag: self.tag.clone(),
            search: self.search.clone(),
            completed: self.completed,
            priority: self.priority,
            status: self.status,
            ..TaskFilter::default()
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TodoPage {
    pub todos: Vec<Task>,
    pub total: usize,
}

#[derive(Deserialize, Debug)]
pub struct CompletedPayload {
    pub completed: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CompletedResponse {
    pub id: String,
    pub completed: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug)]
pub struct StatusPayload {
    pub status: TaskStatus,
}

#[derive(Deserialize, Debug)]
pub struct IdsPayload {
    pub ids: Vec<String>,
}

/// Reference date of a dashboard query, today by default.
#[derive(Deserialize, Debug, Default)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
}

impl DateQuery {
    pub fn date_or_today(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Utc::now().date_naive())
    }
}

/// Handler for listing a page of the caller's tasks.
pub async fn list_todos(
    State(state): State<AppState>,
    caller: AuthUser,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<TodoPage>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(AppError::bad_request("limit must be between 1 and 100."));
    }
    let skip = query.skip.unwrap_or(0);
    let filter = query.filter();
    let sort = query.sort.unwrap_or_default();

    let page = state
        .read_workspace(caller.user.id, |workspace| {
            let matching = workspace.query(&filter, sort);
            TodoPage {
                total: matching.len(),
                todos: matching.into_iter().skip(skip).take(limit).cloned().collect(),
            }
        })
        .await?;

    info!(
        "Successfully retrieved {} of {} tasks.",
        page.todos.len(),
        page.total
    );
    Ok(Json(page))
}

/// Handler for creating a new task.
pub async fn create_todo(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(draft): AppJson<TaskDraft>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    debug!("Received request to create task: {}", draft.title);
    let task = state
        .with_workspace(caller.user.id, |workspace| workspace.create_task(draft))
        .await?;

    info!("Task created successfully with ID: {}", task.id);
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_todo(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<String>,
) -> Result<Json<Task>, AppError> {
    let task = state
        .with_workspace(caller.user.id, |workspace| workspace.task(&id).cloned())
        .await?;
    Ok(Json(task))
}

/// Handler for updating a task. Fields left out of the body keep their value.
pub async fn update_todo(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<String>,
    AppJson(patch): AppJson<TaskPatch>,
) -> Result<Json<Task>, AppError> {
    let task = state
        .with_workspace(caller.user.id, |workspace| workspace.patch_task(&id, patch))
        .await?;
    info!("Task with ID {} updated successfully.", task.id);
    Ok(Json(task))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<String>,
) -> Result<Json<Value>, AppError> {
    debug!("Attempting to delete task with ID: {}", id);
    state
        .with_workspace(caller.user.id, |workspace| workspace.delete_task(&id))
        .await?;
    info!("Task with ID {} deleted successfully.", id);
    Ok(Json(json!({ "success": true })))
}

pub async fn toggle_complete(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<String>,
    AppJson(payload): AppJson<CompletedPayload>,
) -> Result<Json<CompletedResponse>, AppError> {
    let task = state
        .with_workspace(caller.user.id, |workspace| {
            workspace.set_completed(&id, payload.completed)
        })
        .await?;
    Ok(Json(CompletedResponse {
        id: task.id,
        completed: task.completed,
        updated_at: task.updated_at,
    }))
}

pub async fn set_status(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<String>,
    AppJson(payload): AppJson<StatusPayload>,
) -> Result<Json<Task>, AppError> {
    let task = state
        .with_workspace(caller.user.id, |workspace| {
            workspace.set_status(&id, payload.status)
        })
        .await?;
    Ok(Json(task))
}

pub async fn toggle_subtask(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath((id, subtask_id)): AppPath<(String, String)>,
) -> Result<Json<Task>, AppError> {
    let task = state
        .with_workspace(caller.user.id, |workspace| {
            workspace.toggle_subtask(&id, &subtask_id)
        })
        .await?;
    Ok(Json(task))
}

/// Handler for merging several tasks into one.
pub async fn group_todos(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(payload): AppJson<IdsPayload>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let task = state
        .with_workspace(caller.user.id, |workspace| {
            workspace.group_tasks(&payload.ids)
        })
        .await?;
    info!(
        "Grouped {} tasks into {}",
        payload.ids.len(),
        task.id
    );
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn bulk_delete(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(payload): AppJson<IdsPayload>,
) -> Result<Json<Value>, AppError> {
    let deleted = state
        .with_workspace(caller.user.id, |workspace| {
            Ok(workspace.bulk_delete(&payload.ids))
        })
        .await?;
    info!("Bulk deleted {} tasks.", deleted);
    Ok(Json(json!({ "deleted": deleted })))
}

pub async fn upcoming(
    State(state): State<AppState>,
    caller: AuthUser,
    AppQuery(query): AppQuery<DateQuery>,
) -> Result<Json<UpcomingTasks>, AppError> {
    let today = query.date_or_today();
    let filter = TaskFilter {
        category: query.category,
        tag: query.tag,
        search: query.search,
        ..TaskFilter::default()
    };
    let buckets = state
        .read_workspace(caller.user.id, |workspace| {
            workspace.upcoming(&filter, today)
        })
        .await?;
    Ok(Json(buckets))
}

pub async fn stats(
    State(state): State<AppState>,
    caller: AuthUser,
    AppQuery(query): AppQuery<DateQuery>,
) -> Result<Json<TaskStats>, AppError> {
    let today = query.date_or_today();
    let stats = state
        .read_workspace(caller.user.id, |workspace| workspace.stats(today))
        .await?;
    Ok(Json(stats))
}
