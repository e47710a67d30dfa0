// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Category every task falls back to when it names no list.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";
pub const DEFAULT_TAG_COLOR: &str = "#22c55e";
pub const DEFAULT_EVENT_COLOR: &str = "#2c5282";
pub const DEFAULT_NOTE_COLOR: &str = "#fef08a";

pub const MAX_TITLE_LEN: usize = 500;
pub const MAX_DESCRIPTION_LEN: usize = 2000;
pub const MAX_CATEGORY_LEN: usize = 100;

/// Generates a fresh identifier for any entity.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Lifecycle state of a task.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Status implied by a bare completion flag.
    pub fn from_completed(completed: bool) -> Self {
        if completed {
            Self::Completed
        } else {
            Self::Pending
        }
    }

    /// Status implied by a subtask tally.
    pub fn from_subtask_count(done: usize, total: usize) -> Self {
        if total > 0 && done == total {
            Self::Completed
        } else if done > 0 {
            Self::InProgress
        } else {
            Self::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Sort rank, lower comes first (high, medium, low).
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Subtask {
    #[serde(default = "new_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl Subtask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            completed: false,
        }
    }
}

/// A task (todo) of the workspace.
///
/// Stored records written before `status` existed are migrated on read:
/// the status is derived from `completed`, and the pair is then brought in
/// line with the subtask rule (see [`Task::normalize`]).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(from = "TaskRecord")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub status: TaskStatus,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub subtasks: Vec<Subtask>,
}

/// Wire shape accepted when reading tasks, including the camelCase keys of
/// older collections.
#[derive(Deserialize)]
struct TaskRecord {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    status: Option<TaskStatus>,
    #[serde(default)]
    priority: Priority,
    #[serde(default, alias = "dueDate", deserialize_with = "lenient_date")]
    due_date: Option<NaiveDate>,
    #[serde(default = "default_category")]
    category: String,
    #[serde(alias = "createdAt", default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(default, alias = "updatedAt")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    subtasks: Option<Vec<Subtask>>,
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        let status = record
            .status
            .unwrap_or_else(|| TaskStatus::from_completed(record.completed));
        let mut task = Task {
            id: record.id,
            title: record.title,
            description: record.description,
            completed: record.completed,
            status,
            priority: record.priority,
            due_date: record.due_date,
            category: record.category,
            created_at: record.created_at,
            updated_at: record.updated_at,
            subtasks: record.subtasks.unwrap_or_default(),
        };
        task.normalize();
        task
    }
}

impl Task {
    /// Brings `status` and `completed` in line with the subtasks.
    ///
    /// With subtasks: all done forces `completed`, some done forces
    /// `in_progress`, none done cannot be `completed`. The completion flag
    /// always mirrors `status == completed`.
    pub fn normalize(&mut self) {
        if !self.subtasks.is_empty() {
            let done = self.completed_subtasks();
            let total = self.subtasks.len();
            if done == total {
                self.status = TaskStatus::Completed;
            } else if done > 0 {
                self.status = TaskStatus::InProgress;
            } else if self.status == TaskStatus::Completed {
                self.status = TaskStatus::Pending;
            }
        }
        self.completed = self.status == TaskStatus::Completed;
    }

    pub fn completed_subtasks(&self) -> usize {
        self.subtasks.iter().filter(|st| st.completed).count()
    }

    pub fn is_open(&self) -> bool {
        self.status != TaskStatus::Completed
    }

    /// Share of the task that is done, in `[0, 1]`.
    pub fn completion_fraction(&self) -> f64 {
        if self.completed || self.status == TaskStatus::Completed {
            return 1.0;
        }
        if self.subtasks.is_empty() {
            return 0.0;
        }
        self.completed_subtasks() as f64 / self.subtasks.len() as f64
    }

    /// Case-insensitive substring match on title or description.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
    }

    /// The editable fields of this task, e.g. to merge a patch into.
    pub fn to_draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            completed: self.completed,
            status: Some(self.status),
            priority: self.priority,
            due_date: self.due_date,
            category: self.category.clone(),
            subtasks: self.subtasks.clone(),
        }
    }
}

/// Payload used to create a task or fully replace its editable fields.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, alias = "dueDate", deserialize_with = "lenient_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            completed: false,
            status: None,
            priority: Priority::default(),
            due_date: None,
            category: DEFAULT_CATEGORY.to_string(),
            subtasks: Vec::new(),
        }
    }

    /// Merges a partial update; absent fields keep their current value.
    ///
    /// A completion or status change without new subtasks carries the
    /// subtasks along: completed ticks them all, pending clears them all.
    pub fn apply(mut self, patch: TaskPatch) -> Self {
        let status_changed = patch.completed.is_some() || patch.status.is_some();
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
            // An explicit completion flag wins over the stored status.
            self.status = Some(TaskStatus::from_completed(completed));
        }
        if let Some(status) = patch.status {
            self.status = Some(status);
            self.completed = status == TaskStatus::Completed;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(subtasks) = patch.subtasks {
            self.subtasks = subtasks;
        } else if status_changed {
            match self.status {
                Some(TaskStatus::Completed) => {
                    self.subtasks.iter_mut().for_each(|st| st.completed = true)
                }
                Some(TaskStatus::Pending) => {
                    self.subtasks.iter_mut().for_each(|st| st.completed = false)
                }
                Some(TaskStatus::InProgress) | None => {}
            }
        }
        self
    }

    /// True when the draft asks for `in_progress` although every subtask is
    /// already done.
    pub fn in_progress_without_open_subtasks(&self) -> bool {
        self.status == Some(TaskStatus::InProgress)
            && !self.subtasks.is_empty()
            && self.subtasks.iter().all(|st| st.completed)
    }
}

/// Partial task update. `due_date: Some(None)` clears the due date.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    #[serde(default, alias = "dueDate", deserialize_with = "lenient_date_patch")]
    pub due_date: Option<Option<NaiveDate>>,
    pub category: Option<String>,
    pub subtasks: Option<Vec<Subtask>>,
}

/// A list (category) tasks belong to by name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TaskList {
    pub id: String,
    pub name: String,
    pub color: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl Tag {
    /// Tags seeded into a workspace that never stored any.
    pub fn defaults() -> Vec<Tag> {
        vec![
            Tag {
                id: "1".to_string(),
                name: "Tag 1".to_string(),
                color: DEFAULT_TAG_COLOR.to_string(),
            },
            Tag {
                id: "2".to_string(),
                name: "Tag 2".to_string(),
                color: "#ef4444".to_string(),
            },
        ]
    }
}

/// Payload shared by list and tag creation.
#[derive(Deserialize, Debug, Clone)]
pub struct NamedColorPayload {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    // "HH:MM"
    #[serde(alias = "startTime")]
    pub start_time: String,
    #[serde(alias = "endTime")]
    pub end_time: String,
    pub date: NaiveDate,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Payload used to create or replace a calendar event.
#[derive(Deserialize, Debug, Clone)]
pub struct EventDraft {
    pub title: String,
    #[serde(alias = "startTime", default = "default_start_time")]
    pub start_time: String,
    #[serde(alias = "endTime", default = "default_end_time")]
    pub end_time: String,
    // Defaults to the current day when missing.
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
    pub color: Option<String>,
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StickyNote {
    pub id: String,
    pub title: String,
    // One bullet per line.
    #[serde(default)]
    pub content: String,
    pub color: String,
    #[serde(alias = "createdAt", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl StickyNote {
    /// Non-empty content lines, rendered as bullets.
    pub fn bullets(&self) -> Vec<&str> {
        self.content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct NoteDraft {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub color: Option<String>,
}

/// Public profile of an account, as returned by the API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserProfile {
    #[sqlx(rename = "id")]
    pub id: i64,

    #[sqlx(rename = "username")]
    pub username: String,

    #[sqlx(rename = "email")]
    pub email: String,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_start_time() -> String {
    "09:00".to_string()
}

fn default_end_time() -> String {
    "10:00".to_string()
}

/// Parses `YYYY-MM-DD` or an RFC 3339 timestamp (keeping its date).
pub fn parse_lenient_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive())
}

// Empty strings mean "no date"; anything else must parse.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_lenient_date(value).map(Some).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid date '{value}', expected YYYY-MM-DD or ISO 8601"
            ))
        }),
    }
}

fn lenient_date_patch<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_date(deserializer).map(Some)
}
