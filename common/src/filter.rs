// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Task filtering, sorting and the upcoming time buckets.

use std::cmp::Ordering;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::{Priority, Task, TaskStatus};

/// Sort order for task listings.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskSort {
    /// Newest first.
    #[default]
    Created,
    /// Due date ascending, undated tasks last.
    Date,
    /// High, medium, low.
    Priority,
    Title,
}

/// Filter pipeline applied to a task collection.
///
/// The stages run in a fixed order: completed tasks are dropped (when the
/// view asks for it), then category, then tag, then the free-text search.
/// The remaining equality filters only exist for the REST listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub exclude_completed: bool,
    /// Exact, case-sensitive match on the task category.
    pub category: Option<String>,
    /// Tags are matched against the category field as well.
    pub tag: Option<String>,
    /// Case-insensitive substring on title or description.
    pub search: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
}

impl TaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_only(mut self) -> Self {
        self.exclude_completed = true;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Check whether a single task passes every stage.
    pub fn matches(&self, task: &Task) -> bool {
        if self.exclude_completed && !task.is_open() {
            return false;
        }
        if let Some(category) = self.category.as_deref() {
            if task.category != category {
                return false;
            }
        }
        if let Some(tag) = self.tag.as_deref() {
            if task.category != tag {
                return false;
            }
        }
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() && !task.matches_search(search) {
                return false;
            }
        }
        if let Some(completed) = self.completed {
            if task.completed != completed {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|task| self.matches(task)).collect()
    }
}

/// Sorts in place. The sort is stable, ties keep collection order.
pub fn sort_tasks(tasks: &mut [&Task], sort: TaskSort) {
    match sort {
        TaskSort::Created => tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        TaskSort::Date => tasks.sort_by(|a, b| match (a.due_date, b.due_date) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
        TaskSort::Priority => tasks.sort_by_key(|task| task.priority.rank()),
        TaskSort::Title => tasks.sort_by(|a, b| a.title.cmp(&b.title)),
    }
}

/// Open tasks due in the near future, split by period.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UpcomingTasks {
    pub tomorrow: Vec<Task>,
    pub this_week: Vec<Task>,
}

/// Buckets the open tasks that pass `filter` relative to `today`.
///
/// `tomorrow` holds tasks due exactly tomorrow; `this_week` those due from
/// the day after tomorrow up to a week from today.
pub fn upcoming(tasks: &[Task], filter: &TaskFilter, today: NaiveDate) -> UpcomingTasks {
    let filter = filter.clone().open_only();
    let mut buckets = UpcomingTasks {
        tomorrow: Vec::new(),
        this_week: Vec::new(),
    };
    // Nothing can be due after the last representable day.
    let Some(tomorrow) = today.succ_opt() else {
        return buckets;
    };
    let week_end = today
        .checked_add_days(Days::new(7))
        .unwrap_or(NaiveDate::MAX);

    for task in filter.apply(tasks) {
        match task.due_date {
            Some(due) if due == tomorrow => buckets.tomorrow.push(task.clone()),
            Some(due) if due > tomorrow && due <= week_end => {
                buckets.this_week.push(task.clone())
            }
            _ => {}
        }
    }
    buckets
}

/// Open tasks due on a given day.
pub fn due_on(tasks: &[Task], date: NaiveDate) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|task| task.is_open() && task.due_date == Some(date))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TaskEngine;
    use crate::model::TaskDraft;
    use pretty_assertions::assert_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> TaskEngine {
        let mut engine = TaskEngine::default();
        let drafts = vec![
            TaskDraft {
                category: "Work".to_string(),
                description: "Quarterly REPORT".to_string(),
                priority: crate::model::Priority::Low,
                due_date: Some(day(2025, 6, 12)),
                ..TaskDraft::new("Write summary")
            },
            TaskDraft {
                category: "work".to_string(),
                due_date: Some(day(2025, 6, 11)),
                ..TaskDraft::new("Lowercase category")
            },
            TaskDraft {
                category: "Work".to_string(),
                completed: true,
                priority: crate::model::Priority::High,
                ..TaskDraft::new("Done thing")
            },
            TaskDraft {
                category: "Home".to_string(),
                due_date: Some(day(2025, 6, 18)),
                ..TaskDraft::new("Water plants")
            },
        ];
        for draft in drafts {
            engine.create(draft).unwrap();
        }
        engine
    }

    #[test]
    fn test_category_filter_is_exact_and_case_sensitive() {
        let engine = sample();

        let filtered = TaskFilter::new().with_category("Work").apply(engine.tasks());

        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|task| task.category == "Work"));
    }

    #[test]
    fn test_tag_filter_uses_category_field() {
        let engine = sample();
        let filtered = TaskFilter::new().with_tag("Home").apply(engine.tasks());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "Water plants");
    }

    #[test]
    fn test_search_matches_title_or_description_ignoring_case() {
        let engine = sample();

        let by_description = TaskFilter::new().with_search("report").apply(engine.tasks());
        assert_eq!(by_description.len(), 1);

        let by_title = TaskFilter::new().with_search("WATER").apply(engine.tasks());
        assert_eq!(by_title.len(), 1);

        let blank = TaskFilter::new().with_search("   ").apply(engine.tasks());
        assert_eq!(blank.len(), 4);
    }

    #[test]
    fn test_open_only_drops_completed() {
        let engine = sample();
        let filtered = TaskFilter::new()
            .open_only()
            .with_category("Work")
            .apply(engine.tasks());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "Write summary");
    }

    #[test]
    fn test_sort_by_date_puts_undated_last() {
        let engine = sample();
        let mut tasks: Vec<&Task> = engine.tasks().iter().collect();

        sort_tasks(&mut tasks, TaskSort::Date);

        let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Lowercase category", "Write summary", "Water plants", "Done thing"]
        );
    }

    #[test]
    fn test_sort_by_priority_and_title() {
        let engine = sample();
        let mut tasks: Vec<&Task> = engine.tasks().iter().collect();

        sort_tasks(&mut tasks, TaskSort::Priority);
        assert_eq!(tasks[0].title, "Done thing");
        assert_eq!(tasks[3].title, "Write summary");

        sort_tasks(&mut tasks, TaskSort::Title);
        assert_eq!(tasks[0].title, "Done thing");
        assert_eq!(tasks[3].title, "Write summary");
    }

    #[test]
    fn test_upcoming_buckets() {
        let engine = sample();
        let today = day(2025, 6, 10);

        let buckets = upcoming(engine.tasks(), &TaskFilter::new(), today);

        assert_eq!(buckets.tomorrow.len(), 1);
        assert_eq!(buckets.tomorrow[0].title, "Lowercase category");
        // 12th is in range, 18th is more than a week out.
        assert_eq!(buckets.this_week.len(), 1);
        assert_eq!(buckets.this_week[0].title, "Write summary");

        let filtered = upcoming(
            engine.tasks(),
            &TaskFilter::new().with_category("Work"),
            today,
        );
        assert!(filtered.tomorrow.is_empty());
        assert_eq!(filtered.this_week.len(), 1);
    }

    #[test]
    fn test_upcoming_near_end_of_date_range() {
        let mut engine = TaskEngine::default();
        engine
            .create(TaskDraft {
                due_date: Some(NaiveDate::MAX),
                ..TaskDraft::new("Last day")
            })
            .unwrap();

        let buckets = upcoming(engine.tasks(), &TaskFilter::new(), NaiveDate::MAX);
        assert!(buckets.tomorrow.is_empty());
        assert!(buckets.this_week.is_empty());

        let today = NaiveDate::MAX.checked_sub_days(Days::new(3)).unwrap();
        let buckets = upcoming(engine.tasks(), &TaskFilter::new(), today);
        assert_eq!(buckets.this_week.len(), 1);
    }

    #[test]
    fn test_due_on() {
        let engine = sample();
        assert_eq!(due_on(engine.tasks(), day(2025, 6, 18)).len(), 1);
        assert!(due_on(engine.tasks(), day(2025, 6, 19)).is_empty());
    }
}
