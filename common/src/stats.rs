// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{Task, TaskList, TaskStatus};

const RECENT_TASKS: usize = 5;

/// Dashboard counters over a task collection.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TaskStats {
    pub total: usize,
    pub open: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    /// Open tasks due after today.
    pub upcoming: usize,
    /// Mean completion fraction as a rounded percentage.
    pub completion_rate: u32,
    pub in_progress_completion_rate: Option<u32>,
    pub recent: Vec<Task>,
    /// Open tasks per list name.
    pub list_counts: BTreeMap<String, usize>,
}

impl TaskStats {
    pub fn compute(tasks: &[Task], lists: &[TaskList], today: NaiveDate) -> Self {
        let count_status = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();
        let in_progress: Vec<&Task> = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .collect();

        let mut recent: Vec<&Task> = tasks.iter().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Self {
            total: tasks.len(),
            open: tasks.iter().filter(|t| t.is_open()).count(),
            pending: count_status(TaskStatus::Pending),
            in_progress: in_progress.len(),
            completed: count_status(TaskStatus::Completed),
            upcoming: tasks
                .iter()
                .filter(|t| t.is_open() && t.due_date.is_some_and(|due| due > today))
                .count(),
            completion_rate: mean_percent(tasks.iter()).unwrap_or(0),
            in_progress_completion_rate: mean_percent(in_progress.iter().copied()),
            recent: recent.into_iter().take(RECENT_TASKS).cloned().collect(),
            list_counts: lists
                .iter()
                .map(|list| (list.name.clone(), open_count_for(tasks, &list.name)))
                .collect(),
        }
    }
}

/// Open tasks whose category is `name`.
pub fn open_count_for(tasks: &[Task], name: &str) -> usize {
    tasks
        .iter()
        .filter(|t| t.category == name && t.is_open())
        .count()
}

fn mean_percent<'a>(tasks: impl Iterator<Item = &'a Task>) -> Option<u32> {
    let (sum, count) = tasks.fold((0.0, 0usize), |(sum, count), task| {
        (sum + task.completion_fraction(), count + 1)
    });
    if count == 0 {
        return None;
    }
    Some((sum / count as f64 * 100.0).round() as u32)
}
