// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::calendar;
use crate::engine::TaskEngine;
use crate::error::{CoreError, Result, StoreError};
use crate::filter::{self, TaskFilter, TaskSort, UpcomingTasks};
use crate::model::{
    CalendarEvent, DEFAULT_CATEGORY, DEFAULT_EVENT_COLOR, DEFAULT_TAG_COLOR, EventDraft,
    NamedColorPayload, NoteDraft, StickyNote, Tag, Task, TaskDraft, TaskList, TaskPatch,
    TaskStatus, new_id,
};
use crate::palette;
use crate::stats::TaskStats;
use crate::sticky::{DragOutcome, DragSession, Point, StickyBoard};
use crate::store::{self, Collection, KeyValueStore};

/// One user's tasks, lists, tags, calendar events and sticky notes.
///
/// Lifecycle: [`Workspace::load`] from a store, apply operations, then
/// [`Workspace::flush`] back. Every mutation marks its collection dirty and
/// a flush overwrites each dirty collection whole.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    engine: TaskEngine,
    lists: Vec<TaskList>,
    tags: Vec<Tag>,
    events: Vec<CalendarEvent>,
    board: StickyBoard,
    dirty: BTreeSet<Collection>,
}

impl Workspace {
    /// Reads every collection. Unreadable collections come back empty.
    pub fn load<S>(store: &S) -> Self
    where
        S: KeyValueStore + ?Sized,
    {
        let tasks = store::load_collection::<Task, S>(store, Collection::Tasks);
        let lists = store::load_collection::<TaskList, S>(store, Collection::Lists);
        let tags = store::load_collection::<Tag, S>(store, Collection::Tags);
        let events = store::load_collection::<CalendarEvent, S>(store, Collection::CalendarEvents);
        let notes = store::load_sticky_notes(store);

        let mut dirty = BTreeSet::new();
        if notes.needs_rewrite {
            dirty.insert(Collection::StickyNotes);
        }

        Self {
            engine: TaskEngine::new(tasks.items),
            lists: lists.items,
            tags: if tags.missing { Tag::defaults() } else { tags.items },
            events: events.items,
            board: StickyBoard::new(notes.items),
            dirty,
        }
    }

    /// Writes every dirty collection and returns how many were written.
    pub fn flush<S>(&mut self, store: &mut S) -> std::result::Result<usize, StoreError>
    where
        S: KeyValueStore + ?Sized,
    {
        let dirty = std::mem::take(&mut self.dirty);
        let mut written = 0;
        for collection in &dirty {
            let result = match collection {
                Collection::Tasks => store::save_collection(&mut *store, *collection, self.engine.tasks()),
                Collection::Lists => store::save_collection(&mut *store, *collection, &self.lists),
                Collection::Tags => store::save_collection(&mut *store, *collection, &self.tags),
                Collection::CalendarEvents => {
                    store::save_collection(&mut *store, *collection, &self.events)
                }
                Collection::StickyNotes => {
                    store::save_collection(&mut *store, *collection, self.board.notes())
                }
            };
            if let Err(e) = result {
                // Keep what was not written so a retry can pick it up.
                self.dirty = dirty.range(*collection..).copied().collect();
                return Err(e);
            }
            written += 1;
        }
        if written > 0 {
            info!("Flushed {} collections", written);
        }
        Ok(written)
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    fn touch(&mut self, collection: Collection) {
        self.dirty.insert(collection);
    }

    // --- Tasks ---

    pub fn tasks(&self) -> &[Task] {
        self.engine.tasks()
    }

    pub fn task(&self, id: &str) -> Result<&Task> {
        self.engine
            .get(id)
            .ok_or_else(|| CoreError::TaskNotFound(id.to_string()))
    }

    /// Tasks passing `filter`, in `sort` order.
    pub fn query(&self, filter: &TaskFilter, sort: TaskSort) -> Vec<&Task> {
        let mut tasks = filter.apply(self.engine.tasks());
        filter::sort_tasks(&mut tasks, sort);
        tasks
    }

    pub fn upcoming(&self, filter: &TaskFilter, today: NaiveDate) -> UpcomingTasks {
        filter::upcoming(self.engine.tasks(), filter, today)
    }

    pub fn stats(&self, today: NaiveDate) -> TaskStats {
        TaskStats::compute(self.engine.tasks(), &self.lists, today)
    }

    /// A category is valid when it is the default or names a list.
    fn ensure_category(&self, category: &str) -> Result<()> {
        let category = category.trim();
        if category == DEFAULT_CATEGORY || self.lists.iter().any(|l| l.name == category) {
            Ok(())
        } else {
            Err(CoreError::UnknownCategory(category.to_string()))
        }
    }

    pub fn create_task(&mut self, draft: TaskDraft) -> Result<Task> {
        self.ensure_category(&draft.category)?;
        let task = self.engine.create(draft)?.clone();
        self.touch(Collection::Tasks);
        Ok(task)
    }

    pub fn update_task(&mut self, id: &str, draft: TaskDraft) -> Result<Task> {
        let current = self.task(id)?;
        // Tasks may keep a category they already had.
        if current.category != draft.category.trim() {
            self.ensure_category(&draft.category)?;
        }
        let task = self.engine.update(id, draft)?.clone();
        self.touch(Collection::Tasks);
        Ok(task)
    }

    /// Merges a partial update into the task, then replaces it.
    pub fn patch_task(&mut self, id: &str, patch: TaskPatch) -> Result<Task> {
        let touches_status = patch.completed.is_some() || patch.status.is_some();
        let draft = self.task(id)?.to_draft().apply(patch);
        if touches_status && draft.in_progress_without_open_subtasks() {
            return Err(CoreError::validation(
                "status",
                "in_progress needs at least one open subtask",
            ));
        }
        self.update_task(id, draft)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<Task> {
        let task = self.engine.delete(id)?;
        self.touch(Collection::Tasks);
        Ok(task)
    }

    pub fn toggle_complete(&mut self, id: &str) -> Result<Task> {
        let task = self.engine.toggle_complete(id)?.clone();
        self.touch(Collection::Tasks);
        Ok(task)
    }

    pub fn set_completed(&mut self, id: &str, completed: bool) -> Result<Task> {
        let task = self.engine.set_completed(id, completed)?.clone();
        self.touch(Collection::Tasks);
        Ok(task)
    }

    pub fn set_status(&mut self, id: &str, status: TaskStatus) -> Result<Task> {
        let task = self.engine.set_status(id, status)?.clone();
        self.touch(Collection::Tasks);
        Ok(task)
    }

    pub fn toggle_subtask(&mut self, task_id: &str, subtask_id: &str) -> Result<Task> {
        let task = self.engine.toggle_subtask(task_id, subtask_id)?.clone();
        self.touch(Collection::Tasks);
        Ok(task)
    }

    pub fn group_tasks(&mut self, ids: &[String]) -> Result<Task> {
        let task = self.engine.group(ids)?.clone();
        self.touch(Collection::Tasks);
        Ok(task)
    }

    pub fn bulk_delete(&mut self, ids: &[String]) -> usize {
        let removed = self.engine.bulk_delete(ids);
        if removed > 0 {
            self.touch(Collection::Tasks);
        }
        removed
    }

    // --- Lists ---

    pub fn lists(&self) -> &[TaskList] {
        &self.lists
    }

    pub fn add_list(&mut self, payload: NamedColorPayload) -> Result<TaskList> {
        let name = payload.name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::EmptyField("Name"));
        }
        if self.lists.iter().any(|list| list.name == name) {
            return Err(CoreError::DuplicateList(name));
        }
        let list = TaskList {
            id: new_id(),
            color: payload
                .color
                .unwrap_or_else(|| palette::next_list_color(&self.lists)),
            name,
        };
        self.lists.push(list.clone());
        self.touch(Collection::Lists);
        Ok(list)
    }

    /// Removes a list and moves its tasks to the first remaining list, or
    /// to the default category. Returns the list and the moved task count.
    pub fn delete_list(&mut self, id: &str) -> Result<(TaskList, usize)> {
        let index = self
            .lists
            .iter()
            .position(|list| list.id == id)
            .ok_or_else(|| CoreError::ListNotFound(id.to_string()))?;
        let removed = self.lists.remove(index);
        self.touch(Collection::Lists);

        let fallback = self
            .lists
            .first()
            .map(|list| list.name.clone())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        let relabeled = self.engine.relabel_category(&removed.name, &fallback);
        if relabeled > 0 {
            debug!(
                "Moved {} tasks from '{}' to '{}'",
                relabeled, removed.name, fallback
            );
            self.touch(Collection::Tasks);
        }
        Ok((removed, relabeled))
    }

    // --- Tags ---

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn add_tag(&mut self, payload: NamedColorPayload) -> Result<Tag> {
        let name = payload.name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::EmptyField("Name"));
        }
        let tag = Tag {
            id: new_id(),
            name,
            color: payload
                .color
                .unwrap_or_else(|| DEFAULT_TAG_COLOR.to_string()),
        };
        self.tags.push(tag.clone());
        self.touch(Collection::Tags);
        Ok(tag)
    }

    pub fn delete_tag(&mut self, id: &str) -> Result<Tag> {
        let index = self
            .tags
            .iter()
            .position(|tag| tag.id == id)
            .ok_or_else(|| CoreError::TagNotFound(id.to_string()))?;
        self.touch(Collection::Tags);
        Ok(self.tags.remove(index))
    }

    // --- Calendar events ---

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn events_on(&self, date: NaiveDate) -> Vec<&CalendarEvent> {
        calendar::events_for_date(&self.events, date)
    }

    pub fn add_event(&mut self, draft: EventDraft, today: NaiveDate) -> Result<CalendarEvent> {
        let event = build_event(new_id(), draft, today)?;
        self.events.push(event.clone());
        self.touch(Collection::CalendarEvents);
        Ok(event)
    }

    pub fn update_event(
        &mut self,
        id: &str,
        draft: EventDraft,
        today: NaiveDate,
    ) -> Result<CalendarEvent> {
        let index = self
            .events
            .iter()
            .position(|event| event.id == id)
            .ok_or_else(|| CoreError::EventNotFound(id.to_string()))?;
        let mut draft = draft;
        let current = &self.events[index];
        // Omitted date and color keep the current ones.
        draft.date.get_or_insert(current.date);
        if draft.color.is_none() {
            draft.color = Some(current.color.clone());
        }
        let event = build_event(id.to_string(), draft, today)?;
        self.events[index] = event.clone();
        self.touch(Collection::CalendarEvents);
        Ok(event)
    }

    pub fn delete_event(&mut self, id: &str) -> Result<CalendarEvent> {
        let index = self
            .events
            .iter()
            .position(|event| event.id == id)
            .ok_or_else(|| CoreError::EventNotFound(id.to_string()))?;
        self.touch(Collection::CalendarEvents);
        Ok(self.events.remove(index))
    }

    // --- Sticky notes ---

    pub fn notes(&self) -> &[StickyNote] {
        self.board.notes()
    }

    pub fn add_note(&mut self, draft: NoteDraft) -> Result<StickyNote> {
        let note = self.board.add(draft)?.clone();
        self.touch(Collection::StickyNotes);
        Ok(note)
    }

    pub fn update_note(&mut self, id: &str, draft: NoteDraft) -> Result<StickyNote> {
        let note = self.board.update(id, draft)?.clone();
        self.touch(Collection::StickyNotes);
        Ok(note)
    }

    pub fn delete_note(&mut self, id: &str) -> Result<StickyNote> {
        let note = self.board.delete(id)?;
        self.touch(Collection::StickyNotes);
        Ok(note)
    }

    pub fn move_note(&mut self, id: &str, index: usize) -> Result<usize> {
        let index = self.board.move_to(id, index)?;
        self.touch(Collection::StickyNotes);
        Ok(index)
    }

    /// Moves the dragged note live. Nothing is marked for saving until the
    /// drag is released.
    pub fn drag_note(&mut self, session: &mut DragSession, pointer: Point, grid_width: f64) -> Option<usize> {
        session.drag_to(&mut self.board, pointer, grid_width)
    }

    pub fn release_note_drag(&mut self, session: DragSession) -> DragOutcome {
        let outcome = session.release();
        if matches!(outcome, DragOutcome::Reordered { .. }) {
            self.touch(Collection::StickyNotes);
        }
        outcome
    }
}

fn build_event(id: String, draft: EventDraft, today: NaiveDate) -> Result<CalendarEvent> {
    let title = draft.title.trim().to_string();
    if title.is_empty() {
        return Err(CoreError::EmptyField("Title"));
    }
    calendar::time_position(&draft.start_time)?;
    calendar::time_position(&draft.end_time)?;
    Ok(CalendarEvent {
        id,
        title,
        start_time: draft.start_time.trim().to_string(),
        end_time: draft.end_time.trim().to_string(),
        date: draft.date.unwrap_or(today),
        color: draft
            .color
            .unwrap_or_else(|| DEFAULT_EVENT_COLOR.to_string()),
        description: draft.description.filter(|d| !d.trim().is_empty()),
    })
}
