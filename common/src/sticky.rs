// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::model::{DEFAULT_NOTE_COLOR, NoteDraft, StickyNote, new_id};

/// Width of one grid cell: a 280px card plus the 24px gap.
pub const GRID_SIZE: f64 = 304.0;
pub const GRID_GAP: f64 = 24.0;
/// Pointer travel (px) beyond which a press counts as a drag, not a click.
pub const DRAG_THRESHOLD: f64 = 5.0;

/// The sticky-note wall. Order on screen is order in the vector.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct StickyBoard {
    notes: Vec<StickyNote>,
}

impl StickyBoard {
    pub fn new(notes: Vec<StickyNote>) -> Self {
        Self { notes }
    }

    pub fn notes(&self) -> &[StickyNote] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&StickyNote> {
        self.notes.iter().find(|note| note.id == id)
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.notes
            .iter()
            .position(|note| note.id == id)
            .ok_or_else(|| CoreError::NoteNotFound(id.to_string()))
    }

    /// Appends a new note at the end of the wall.
    pub fn add(&mut self, draft: NoteDraft) -> Result<&StickyNote> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(CoreError::EmptyField("Title"));
        }
        self.notes.push(StickyNote {
            id: new_id(),
            title: title.to_string(),
            content: draft.content,
            color: draft.color.unwrap_or_else(|| DEFAULT_NOTE_COLOR.to_string()),
            created_at: Utc::now(),
        });
        Ok(&self.notes[self.notes.len() - 1])
    }

    pub fn update(&mut self, id: &str, draft: NoteDraft) -> Result<&StickyNote> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(CoreError::EmptyField("Title"));
        }
        let index = self.position(id)?;
        let note = &mut self.notes[index];
        note.title = title;
        note.content = draft.content;
        if let Some(color) = draft.color {
            note.color = color;
        }
        Ok(note)
    }

    pub fn delete(&mut self, id: &str) -> Result<StickyNote> {
        let index = self.position(id)?;
        Ok(self.notes.remove(index))
    }

    /// Takes a note out and re-inserts it at `index` (clamped to the end).
    pub fn move_to(&mut self, id: &str, index: usize) -> Result<usize> {
        let from = self.position(id)?;
        let note = self.notes.remove(from);
        let to = index.min(self.notes.len());
        self.notes.insert(to, note);
        Ok(to)
    }
}

/// Pointer position relative to the top-left corner of the note grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// What a finished gesture amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// The note moved; the new order must be saved.
    Reordered { note_id: String },
    /// The pointer barely moved; open the note for editing.
    Click { note_id: String },
}

/// A drag in progress. Created on pointer-down, consumed on release.
#[derive(Debug)]
pub struct DragSession {
    note_id: String,
    start: Point,
    dragged: bool,
}

impl DragSession {
    pub fn begin(note_id: impl Into<String>, start: Point) -> Self {
        Self {
            note_id: note_id.into(),
            start,
            dragged: false,
        }
    }

    pub fn note_id(&self) -> &str {
        &self.note_id
    }

    pub fn has_dragged(&self) -> bool {
        self.dragged
    }

    /// Follows the pointer and moves the note to the grid cell under it.
    ///
    /// Returns the note's new index, or `None` when the note vanished from
    /// the board meanwhile.
    pub fn drag_to(&mut self, board: &mut StickyBoard, pointer: Point, grid_width: f64) -> Option<usize> {
        if pointer.distance(self.start) > DRAG_THRESHOLD {
            self.dragged = true;
        }
        let target = target_index(pointer, grid_width);
        board.move_to(&self.note_id, target).ok()
    }

    /// Ends the gesture.
    pub fn release(self) -> DragOutcome {
        debug!(
            "Released note {} (dragged: {})",
            self.note_id, self.dragged
        );
        if self.dragged {
            DragOutcome::Reordered {
                note_id: self.note_id,
            }
        } else {
            DragOutcome::Click {
                note_id: self.note_id,
            }
        }
    }
}

/// Number of columns that fit in a grid of the given width, at least one.
pub fn grid_columns(grid_width: f64) -> usize {
    (((grid_width + GRID_GAP) / GRID_SIZE).floor() as usize).max(1)
}

/// Index of the grid cell under `pointer`, in reading order.
pub fn target_index(pointer: Point, grid_width: f64) -> usize {
    let columns = grid_columns(grid_width);
    // Float to usize casts saturate, negative coordinates land on 0.
    let column = ((pointer.x / GRID_SIZE).floor() as usize).min(columns - 1);
    let row = (pointer.y / GRID_SIZE).floor() as usize;
    row.saturating_mul(columns).saturating_add(column)
}
