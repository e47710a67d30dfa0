// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{Json, extract::State, http::StatusCode};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use taskflow_common::calendar;
use taskflow_common::filter;
use taskflow_common::{CalendarEvent, CoreError, EventDraft, Task, Workspace};
use tracing::info;

use super::{AppError, AppJson, AppPath, AppQuery};
use crate::auth::AuthUser;
use crate::state::AppState;

#[derive(Deserialize, Debug, Default)]
pub struct CalendarQuery {
    pub date: Option<NaiveDate>,
}

impl CalendarQuery {
    fn date_or_today(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Utc::now().date_naive())
    }
}

/// An event with its position in the day column. Events with unreadable
/// times have no position.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlacedEvent {
    #[serde(flatten)]
    pub event: CalendarEvent,
    pub top: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub label: String,
    pub day_name: String,
    pub hours: Vec<u32>,
    pub events: Vec<PlacedEvent>,
    /// Open tasks due that day.
    pub tasks: Vec<Task>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WeekDay {
    pub date: NaiveDate,
    pub day_name: String,
    pub events: Vec<PlacedEvent>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WeekSchedule {
    pub date: NaiveDate,
    pub label: String,
    pub hours: Vec<u32>,
    pub days: Vec<WeekDay>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MonthCell {
    pub date: NaiveDate,
    pub events: Vec<CalendarEvent>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MonthSchedule {
    pub date: NaiveDate,
    pub label: String,
    /// Leading `null`s pad the first week up to the 1st.
    pub cells: Vec<Option<MonthCell>>,
}

fn placed_events(workspace: &Workspace, date: NaiveDate) -> Vec<PlacedEvent> {
    workspace
        .events_on(date)
        .into_iter()
        .map(|event| {
            let placement = calendar::place_event(event).ok();
            PlacedEvent {
                event: event.clone(),
                top: placement.map(|p| p.top),
                height: placement.map(|p| p.height),
            }
        })
        .collect()
}

pub fn day_schedule(workspace: &Workspace, date: NaiveDate) -> DaySchedule {
    DaySchedule {
        date,
        label: calendar::format_long_date(date),
        day_name: calendar::format_day_name(date),
        hours: calendar::day_hours().collect(),
        events: placed_events(workspace, date),
        tasks: filter::due_on(workspace.tasks(), date)
            .into_iter()
            .cloned()
            .collect(),
    }
}

pub fn week_schedule(workspace: &Workspace, date: NaiveDate) -> Result<WeekSchedule, CoreError> {
    Ok(WeekSchedule {
        date,
        label: calendar::format_week_range(date)?,
        hours: calendar::day_hours().collect(),
        days: calendar::week_dates(date)?
            .into_iter()
            .map(|day| WeekDay {
                date: day,
                day_name: calendar::format_day_name(day),
                events: placed_events(workspace, day),
            })
            .collect(),
    })
}

pub fn month_schedule(workspace: &Workspace, date: NaiveDate) -> MonthSchedule {
    MonthSchedule {
        date,
        label: calendar::format_month_year(date),
        cells: calendar::month_grid(date)
            .into_iter()
            .map(|cell| {
                cell.map(|day| MonthCell {
                    date: day,
                    events: workspace.events_on(day).into_iter().cloned().collect(),
                })
            })
            .collect(),
    }
}

pub async fn day_view(
    State(state): State<AppState>,
    caller: AuthUser,
    AppQuery(query): AppQuery<CalendarQuery>,
) -> Result<Json<DaySchedule>, AppError> {
    let date = query.date_or_today();
    let schedule = state
        .read_workspace(caller.user.id, |workspace| day_schedule(workspace, date))
        .await?;
    Ok(Json(schedule))
}

pub async fn week_view(
    State(state): State<AppState>,
    caller: AuthUser,
    AppQuery(query): AppQuery<CalendarQuery>,
) -> Result<Json<WeekSchedule>, AppError> {
    let date = query.date_or_today();
    let schedule = state
        .read_workspace(caller.user.id, |workspace| week_schedule(workspace, date))
        .await??;
    Ok(Json(schedule))
}

pub async fn month_view(
    State(state): State<AppState>,
    caller: AuthUser,
    AppQuery(query): AppQuery<CalendarQuery>,
) -> Result<Json<MonthSchedule>, AppError> {
    let date = query.date_or_today();
    let schedule = state
        .read_workspace(caller.user.id, |workspace| month_schedule(workspace, date))
        .await?;
    Ok(Json(schedule))
}

/// Handler for listing events, optionally only those of one day.
pub async fn list_events(
    State(state): State<AppState>,
    caller: AuthUser,
    AppQuery(query): AppQuery<CalendarQuery>,
) -> Result<Json<Vec<CalendarEvent>>, AppError> {
    let events = state
        .read_workspace(caller.user.id, |workspace| match query.date {
            Some(date) => workspace.events_on(date).into_iter().cloned().collect(),
            None => workspace.events().to_vec(),
        })
        .await?;
    Ok(Json(events))
}

pub async fn create_event(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(draft): AppJson<EventDraft>,
) -> Result<(StatusCode, Json<CalendarEvent>), AppError> {
    let today = Utc::now().date_naive();
    let event = state
        .with_workspace(caller.user.id, |workspace| workspace.add_event(draft, today))
        .await?;
    info!("Event created successfully with ID: {}", event.id);
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn update_event(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<String>,
    AppJson(draft): AppJson<EventDraft>,
) -> Result<Json<CalendarEvent>, AppError> {
    let today = Utc::now().date_naive();
    let event = state
        .with_workspace(caller.user.id, |workspace| {
            workspace.update_event(&id, draft, today)
        })
        .await?;
    Ok(Json(event))
}

pub async fn delete_event(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<String>,
) -> Result<Json<Value>, AppError> {
    state
        .with_workspace(caller.user.id, |workspace| workspace.delete_event(&id))
        .await?;
    info!("Event with ID {} deleted successfully.", id);
    Ok(Json(json!({ "success": true })))
}
