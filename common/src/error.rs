// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Domain errors of the workspace core.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Task {0} not found")]
    TaskNotFound(String),

    #[error("Subtask {subtask} not found on task {task}")]
    SubtaskNotFound { task: String, subtask: String },

    #[error("List {0} not found")]
    ListNotFound(String),

    #[error("Tag {0} not found")]
    TagNotFound(String),

    #[error("Event {0} not found")]
    EventNotFound(String),

    #[error("Sticky note {0} not found")]
    NoteNotFound(String),

    #[error("A list named '{0}' already exists")]
    DuplicateList(String),

    #[error("Unknown category '{0}'")]
    UnknownCategory(String),

    #[error("Please select at least 2 tasks to group them (got {0})")]
    GroupTooSmall(usize),

    #[error("Invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
}

impl CoreError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for the "no such entity" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TaskNotFound(_)
                | Self::SubtaskNotFound { .. }
                | Self::ListNotFound(_)
                | Self::TagNotFound(_)
                | Self::EventNotFound(_)
                | Self::NoteNotFound(_)
        )
    }
}

/// Failures of the key-value backend behind a workspace.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Failed to serialize collection '{key}'")]
    Serialize {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;
