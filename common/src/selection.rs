// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::{self, CalendarView, Direction};
use crate::error::Result;
use crate::filter::TaskFilter;
use crate::model::{Task, TaskList};
use crate::workspace::Workspace;

/// Top-level screens of the application.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Overview,
    Categories,
    Upcoming,
    Task,
    Calendar,
    Sticky,
}

/// What the user is looking at and which tasks are picked for a bulk action.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ViewState {
    pub view: View,
    pub calendar_view: CalendarView,
    pub current_date: NaiveDate,
    /// Name of the selected list.
    pub selected_list: Option<String>,
    /// Name of the selected tag.
    pub selected_tag: Option<String>,
    pub search_query: String,
    pub category_search_query: String,
    pub selection_mode: bool,
    pub selected: BTreeSet<String>,
}

impl ViewState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            view: View::default(),
            calendar_view: CalendarView::default(),
            current_date: today,
            selected_list: None,
            selected_tag: None,
            search_query: String::new(),
            category_search_query: String::new(),
            selection_mode: false,
            selected: BTreeSet::new(),
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Adds or removes one task from the selection, entering selection mode.
    pub fn toggle_selection(&mut self, id: &str) {
        self.selection_mode = true;
        if !self.selected.remove(id) {
            self.selected.insert(id.to_string());
        }
    }

    /// Selects every visible task, or clears the selection when all of them
    /// are already selected.
    pub fn select_all<'a>(&mut self, visible: impl IntoIterator<Item = &'a str>) {
        let visible: BTreeSet<String> = visible.into_iter().map(str::to_string).collect();
        self.selection_mode = true;
        if !visible.is_empty() && visible.is_subset(&self.selected) {
            self.selected.clear();
        } else {
            self.selected = visible;
        }
    }

    pub fn exit_selection_mode(&mut self) {
        self.selection_mode = false;
        self.selected.clear();
    }

    /// The filter the current view lists tasks with.
    pub fn task_filter(&self) -> TaskFilter {
        TaskFilter {
            exclude_completed: self.view == View::Upcoming,
            category: self.selected_list.clone(),
            tag: self.selected_tag.clone(),
            search: Some(self.search_query.clone()).filter(|q| !q.trim().is_empty()),
            ..TaskFilter::default()
        }
    }

    pub fn visible_tasks<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        self.task_filter().apply(tasks)
    }

    /// Lists whose name contains the category search, ignoring case.
    pub fn filtered_lists<'a>(&self, lists: &'a [TaskList]) -> Vec<&'a TaskList> {
        let query = self.category_search_query.trim().to_lowercase();
        lists
            .iter()
            .filter(|list| query.is_empty() || list.name.to_lowercase().contains(&query))
            .collect()
    }

    pub fn set_calendar_view(&mut self, view: CalendarView) {
        self.calendar_view = view;
    }

    pub fn navigate_calendar(&mut self, direction: Direction) -> NaiveDate {
        self.current_date = calendar::navigate(self.current_date, self.calendar_view, direction);
        self.current_date
    }

    fn selected_ids(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }

    /// Groups the selected tasks. The selection is kept when grouping fails.
    pub fn group_selected(&mut self, workspace: &mut Workspace) -> Result<Task> {
        let task = workspace.group_tasks(&self.selected_ids())?;
        debug!("Grouped {} selected tasks", self.selected.len());
        self.exit_selection_mode();
        Ok(task)
    }

    pub fn delete_selected(&mut self, workspace: &mut Workspace) -> usize {
        let deleted = workspace.bulk_delete(&self.selected_ids());
        self.exit_selection_mode();
        deleted
    }

    /// Clears the list selection if it pointed at the deleted list.
    pub fn forget_list(&mut self, name: &str) {
        if self.selected_list.as_deref() == Some(name) {
            self.selected_list = None;
        }
    }

    pub fn forget_tag(&mut self, name: &str) {
        if self.selected_tag.as_deref() == Some(name) {
            self.selected_tag = None;
        }
    }
}
