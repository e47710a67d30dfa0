// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Domain core of TaskFlow: tasks, lists, tags, calendar events and sticky
//! notes, plus the key-value persistence they load from and flush to.
//!
//! Nothing here does I/O on its own; the server hands a [`store::MemoryStore`]
//! filled from its database to [`workspace::Workspace::load`].

pub mod calendar;
pub mod engine;
pub mod error;
pub mod filter;
pub mod model;
pub mod palette;
pub mod selection;
pub mod stats;
pub mod sticky;
pub mod store;
pub mod workspace;

pub use error::{CoreError, StoreError};
pub use model::{
    CalendarEvent, EventDraft, NamedColorPayload, NoteDraft, Priority, StickyNote, Subtask, Tag,
    Task, TaskDraft, TaskList, TaskPatch, TaskStatus, UserProfile,
};
pub use store::{Collection, KeyValueStore, MemoryStore};
pub use workspace::Workspace;
