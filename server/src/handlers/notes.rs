// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use taskflow_common::{NoteDraft, StickyNote};
use tracing::{debug, info};

use super::{AppError, AppJson, AppPath};
use crate::auth::AuthUser;
use crate::state::AppState;

#[derive(Deserialize, Debug)]
pub struct MovePayload {
    pub index: usize,
}

pub async fn list_notes(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Vec<StickyNote>>, AppError> {
    let notes = state
        .read_workspace(caller.user.id, |workspace| workspace.notes().to_vec())
        .await?;
    Ok(Json(notes))
}

pub async fn create_note(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(draft): AppJson<NoteDraft>,
) -> Result<(StatusCode, Json<StickyNote>), AppError> {
    let note = state
        .with_workspace(caller.user.id, |workspace| workspace.add_note(draft))
        .await?;
    info!("Sticky note created successfully with ID: {}", note.id);
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn update_note(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<String>,
    AppJson(draft): AppJson<NoteDraft>,
) -> Result<Json<StickyNote>, AppError> {
    let note = state
        .with_workspace(caller.user.id, |workspace| workspace.update_note(&id, draft))
        .await?;
    Ok(Json(note))
}

pub async fn delete_note(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<String>,
) -> Result<Json<Value>, AppError> {
    state
        .with_workspace(caller.user.id, |workspace| workspace.delete_note(&id))
        .await?;
    info!("Sticky note with ID {} deleted successfully.", id);
    Ok(Json(json!({ "success": true })))
}

/// Handler for dropping a note at a new position. Returns the reordered board.
pub async fn move_note(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<String>,
    AppJson(payload): AppJson<MovePayload>,
) -> Result<Json<Vec<StickyNote>>, AppError> {
    let notes = state
        .with_workspace(caller.user.id, |workspace| {
            let index = workspace.move_note(&id, payload.index)?;
            debug!("Moved sticky note {} to index {}", id, index);
            Ok(workspace.notes().to_vec())
        })
        .await?;
    Ok(Json(notes))
}
