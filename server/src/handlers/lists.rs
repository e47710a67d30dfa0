// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use taskflow_common::{NamedColorPayload, Tag, TaskList};
use tracing::info;

use super::{AppError, AppJson, AppPath};
use crate::auth::AuthUser;
use crate::state::AppState;

pub async fn list_lists(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Vec<TaskList>>, AppError> {
    let lists = state
        .read_workspace(caller.user.id, |workspace| workspace.lists().to_vec())
        .await?;
    Ok(Json(lists))
}

/// Handler for creating a list. Without a color one is picked from the palette.
pub async fn create_list(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(payload): AppJson<NamedColorPayload>,
) -> Result<(StatusCode, Json<TaskList>), AppError> {
    let list = state
        .with_workspace(caller.user.id, |workspace| workspace.add_list(payload))
        .await?;
    info!("List '{}' created with color {}", list.name, list.color);
    Ok((StatusCode::CREATED, Json(list)))
}

/// Handler for deleting a list. Its tasks move to another list.
pub async fn delete_list(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<String>,
) -> Result<Json<Value>, AppError> {
    let (list, relabeled) = state
        .with_workspace(caller.user.id, |workspace| workspace.delete_list(&id))
        .await?;
    info!("List '{}' deleted, {} tasks relabeled", list.name, relabeled);
    Ok(Json(json!({ "success": true, "relabeled": relabeled })))
}

pub async fn list_tags(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Vec<Tag>>, AppError> {
    let tags = state
        .read_workspace(caller.user.id, |workspace| workspace.tags().to_vec())
        .await?;
    Ok(Json(tags))
}

pub async fn create_tag(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(payload): AppJson<NamedColorPayload>,
) -> Result<(StatusCode, Json<Tag>), AppError> {
    let tag = state
        .with_workspace(caller.user.id, |workspace| workspace.add_tag(payload))
        .await?;
    info!("Tag '{}' created", tag.name);
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<String>,
) -> Result<Json<Value>, AppError> {
    state
        .with_workspace(caller.user.id, |workspace| workspace.delete_tag(&id))
        .await?;
    Ok(Json(json!({ "success": true })))
}
