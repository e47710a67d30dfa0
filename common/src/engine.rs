// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::collections::HashSet;

use chrono::Utc;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::model::{
    MAX_CATEGORY_LEN, MAX_DESCRIPTION_LEN, MAX_TITLE_LEN, Task, TaskDraft, TaskStatus, new_id,
};

/// Holds the task collection and applies every task operation to it.
///
/// Order matters: new and grouped tasks go to the front, like the board
/// shows them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskEngine {
    tasks: Vec<Task>,
}

impl TaskEngine {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| CoreError::TaskNotFound(id.to_string()))
    }

    /// Creates a task from a draft and inserts it at the front.
    pub fn create(&mut self, draft: TaskDraft) -> Result<&Task> {
        let draft = validate_draft(draft)?;
        let mut task = Task {
            id: new_id(),
            title: draft.title,
            description: draft.description,
            completed: draft.completed,
            status: draft
                .status
                .unwrap_or_else(|| TaskStatus::from_completed(draft.completed)),
            priority: draft.priority,
            due_date: draft.due_date,
            category: draft.category,
            created_at: Utc::now(),
            updated_at: None,
            subtasks: draft.subtasks,
        };
        task.normalize();
        debug!("Created task {} ({})", task.id, task.status.as_str());
        self.tasks.insert(0, task);
        Ok(&self.tasks[0])
    }

    /// Replaces every editable field of a task. Id and creation time stay.
    pub fn update(&mut self, id: &str, draft: TaskDraft) -> Result<&Task> {
        let draft = validate_draft(draft)?;
        let task = self.get_mut(id)?;
        task.title = draft.title;
        task.description = draft.description;
        task.status = draft
            .status
            .unwrap_or_else(|| TaskStatus::from_completed(draft.completed));
        task.completed = draft.completed;
        task.priority = draft.priority;
        task.due_date = draft.due_date;
        task.category = draft.category;
        task.subtasks = draft.subtasks;
        task.updated_at = Some(Utc::now());
        task.normalize();
        Ok(task)
    }

    pub fn delete(&mut self, id: &str) -> Result<Task> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| CoreError::TaskNotFound(id.to_string()))?;
        Ok(self.tasks.remove(index))
    }

    /// Flips completion. Subtasks follow the task so the status rule holds.
    pub fn toggle_complete(&mut self, id: &str) -> Result<&Task> {
        let completed = !self
            .get(id)
            .ok_or_else(|| CoreError::TaskNotFound(id.to_string()))?
            .completed;
        self.set_completed(id, completed)
    }

    pub fn set_completed(&mut self, id: &str, completed: bool) -> Result<&Task> {
        let task = self.get_mut(id)?;
        for subtask in &mut task.subtasks {
            subtask.completed = completed;
        }
        task.status = TaskStatus::from_completed(completed);
        task.updated_at = Some(Utc::now());
        task.normalize();
        Ok(task)
    }

    /// Moves a task to another status column.
    pub fn set_status(&mut self, id: &str, status: TaskStatus) -> Result<&Task> {
        let task = self.get_mut(id)?;
        match status {
            TaskStatus::Completed => task.subtasks.iter_mut().for_each(|st| st.completed = true),
            TaskStatus::Pending => task.subtasks.iter_mut().for_each(|st| st.completed = false),
            TaskStatus::InProgress => {
                if !task.subtasks.is_empty() && task.completed_subtasks() == task.subtasks.len() {
                    return Err(CoreError::validation(
                        "status",
                        "in_progress needs at least one open subtask",
                    ));
                }
            }
        }
        task.status = status;
        task.updated_at = Some(Utc::now());
        task.normalize();
        Ok(task)
    }

    /// Flips one subtask and re-derives the task status from the tally.
    pub fn toggle_subtask(&mut self, task_id: &str, subtask_id: &str) -> Result<&Task> {
        let task = self.get_mut(task_id)?;
        let subtask = task
            .subtasks
            .iter_mut()
            .find(|st| st.id == subtask_id)
            .ok_or_else(|| CoreError::SubtaskNotFound {
                task: task_id.to_string(),
                subtask: subtask_id.to_string(),
            })?;
        subtask.completed = !subtask.completed;

        let done = task.completed_subtasks();
        task.status = TaskStatus::from_subtask_count(done, task.subtasks.len());
        task.completed = task.status == TaskStatus::Completed;
        task.updated_at = Some(Utc::now());
        Ok(task)
    }

    /// Merges the selected tasks into one and drops the originals.
    ///
    /// Unknown ids are ignored; at least two existing tasks must be
    /// selected. Shared fields come from the first selected task in
    /// collection order.
    pub fn group(&mut self, ids: &[String]) -> Result<&Task> {
        let selected: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let chosen: Vec<Task> = self
            .tasks
            .iter()
            .filter(|task| selected.contains(task.id.as_str()))
            .cloned()
            .collect();
        if chosen.len() < 2 {
            return Err(CoreError::GroupTooSmall(chosen.len()));
        }

        let first = &chosen[0];
        let mut grouped = Task {
            id: new_id(),
            title: chosen
                .iter()
                .map(|t| t.title.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            description: chosen
                .iter()
                .map(|t| {
                    if t.description.is_empty() {
                        format!("- {}", t.title)
                    } else {
                        format!("- {}: {}", t.title, t.description)
                    }
                })
                .collect::<Vec<_>>()
                .join("\n"),
            completed: false,
            status: TaskStatus::Pending,
            priority: first.priority,
            due_date: first.due_date,
            category: first.category.clone(),
            created_at: Utc::now(),
            updated_at: None,
            subtasks: chosen.iter().flat_map(|t| t.subtasks.clone()).collect(),
        };
        grouped.normalize();
        debug!("Grouped {} tasks into {}", chosen.len(), grouped.id);

        self.tasks.retain(|task| !selected.contains(task.id.as_str()));
        self.tasks.insert(0, grouped);
        Ok(&self.tasks[0])
    }

    /// Removes every listed task and returns how many went away.
    pub fn bulk_delete(&mut self, ids: &[String]) -> usize {
        let selected: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let before = self.tasks.len();
        self.tasks.retain(|task| !selected.contains(task.id.as_str()));
        before - self.tasks.len()
    }

    /// Points every task of category `from` at `to`. Returns the count.
    pub fn relabel_category(&mut self, from: &str, to: &str) -> usize {
        let mut count = 0;
        for task in self.tasks.iter_mut().filter(|task| task.category == from) {
            task.category = to.to_string();
            count += 1;
        }
        count
    }
}

fn validate_draft(mut draft: TaskDraft) -> Result<TaskDraft> {
    draft.title = draft.title.trim().to_string();
    draft.description = draft.description.trim().to_string();
    draft.category = draft.category.trim().to_string();

    if draft.title.is_empty() {
        return Err(CoreError::EmptyField("Title"));
    }
    if draft.title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::validation(
            "title",
            format!("must be at most {MAX_TITLE_LEN} characters"),
        ));
    }
    if draft.description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(CoreError::validation(
            "description",
            format!("must be at most {MAX_DESCRIPTION_LEN} characters"),
        ));
    }
    if draft.category.is_empty() {
        return Err(CoreError::EmptyField("Category"));
    }
    if draft.category.chars().count() > MAX_CATEGORY_LEN {
        return Err(CoreError::validation(
            "category",
            format!("must be at most {MAX_CATEGORY_LEN} characters"),
        ));
    }
    for subtask in &mut draft.subtasks {
        subtask.title = subtask.title.trim().to_string();
    }
    draft.subtasks.retain(|st| !st.title.is_empty());
    Ok(draft)
}
