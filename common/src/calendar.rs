// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Calendar grids and event placement.
//!
//! Everything here is a pure function of a reference date. Weeks start on
//! Monday. The day view renders one pixel per minute from 9 AM.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::model::CalendarEvent;

/// First hour shown in the day view.
pub const DAY_START_HOUR: u32 = 9;
/// Number of hour rows in the day view (9 AM to 8 PM).
pub const DAY_HOUR_ROWS: u32 = 12;
pub const PIXELS_PER_HOUR: f64 = 60.0;
/// Short events still get this much height.
pub const MIN_EVENT_HEIGHT: f64 = 40.0;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CalendarView {
    #[default]
    Day,
    Week,
    Month,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Prev,
    Next,
}

/// Vertical placement of an event in the day column, in pixels.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct EventPlacement {
    pub top: f64,
    pub height: f64,
}

/// The seven dates (Monday to Sunday) of the week containing `date`.
///
/// Fails for the partial weeks at either end of the supported date range.
pub fn week_dates(date: NaiveDate) -> Result<[NaiveDate; 7]> {
    let out_of_range = || CoreError::validation("date", format!("{} is out of range", date));
    let monday = date
        .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
        .ok_or_else(out_of_range)?;
    monday
        .checked_add_days(Days::new(6))
        .ok_or_else(out_of_range)?;
    let mut days = monday.iter_days();
    Ok(std::array::from_fn(|_| days.next().unwrap_or(monday)))
}

/// Month grid cells: leading `None`s so the 1st sits under its weekday,
/// then one entry per day of the month.
pub fn month_grid(date: NaiveDate) -> Vec<Option<NaiveDate>> {
    let first = date.with_day(1).unwrap_or(date);
    let leading = first.weekday().num_days_from_monday() as usize;
    let mut cells: Vec<Option<NaiveDate>> = vec![None; leading];
    cells.extend(
        first
            .iter_days()
            .take_while(|day| day.month() == first.month())
            .map(Some),
    );
    cells
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = date.with_day(1).unwrap_or(date);
    first
        .iter_days()
        .take_while(|day| day.month() == first.month())
        .count() as u32
}

/// Hours since midnight for an `HH:MM` string, e.g. `"09:30"` is 9.5.
pub fn time_position(time: &str) -> Result<f64> {
    let invalid = || CoreError::InvalidTime(time.to_string());
    let (hours, minutes) = time.trim().split_once(':').ok_or_else(invalid)?;
    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    Ok(f64::from(hours) + f64::from(minutes) / 60.0)
}

pub fn event_top(start_time: &str) -> Result<f64> {
    Ok((time_position(start_time)? - f64::from(DAY_START_HOUR)) * PIXELS_PER_HOUR)
}

pub fn event_height(start_time: &str, end_time: &str) -> Result<f64> {
    let span = time_position(end_time)? - time_position(start_time)?;
    Ok((span * PIXELS_PER_HOUR).max(MIN_EVENT_HEIGHT))
}

pub fn place_event(event: &CalendarEvent) -> Result<EventPlacement> {
    Ok(EventPlacement {
        top: event_top(&event.start_time)?,
        height: event_height(&event.start_time, &event.end_time)?,
    })
}

/// Events on `date`, earliest start first. Overlaps are kept as-is.
pub fn events_for_date(events: &[CalendarEvent], date: NaiveDate) -> Vec<&CalendarEvent> {
    let mut day: Vec<&CalendarEvent> = events.iter().filter(|e| e.date == date).collect();
    // Unparseable times sort last.
    day.sort_by(|a, b| {
        let a = time_position(&a.start_time).unwrap_or(f64::MAX);
        let b = time_position(&b.start_time).unwrap_or(f64::MAX);
        a.total_cmp(&b)
    });
    day
}

/// Moves the reference date one page in the given view.
///
/// Month steps keep the day of month, clamped to the target month's length.
pub fn navigate(date: NaiveDate, view: CalendarView, direction: Direction) -> NaiveDate {
    let forward = direction == Direction::Next;
    let shifted = match view {
        CalendarView::Day if forward => date.checked_add_days(Days::new(1)),
        CalendarView::Day => date.checked_sub_days(Days::new(1)),
        CalendarView::Week if forward => date.checked_add_days(Days::new(7)),
        CalendarView::Week => date.checked_sub_days(Days::new(7)),
        CalendarView::Month if forward => date.checked_add_months(Months::new(1)),
        CalendarView::Month => date.checked_sub_months(Months::new(1)),
    };
    // At the ends of the date range the page does not move.
    shifted.unwrap_or(date)
}

/// Hour rows of the day view.
pub fn day_hours() -> impl Iterator<Item = u32> {
    DAY_START_HOUR..DAY_START_HOUR + DAY_HOUR_ROWS
}

/// `3 March 2025`
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%-d %B %Y").to_string()
}

/// `MONDAY`
pub fn format_day_name(date: NaiveDate) -> String {
    date.format("%A").to_string().to_uppercase()
}

/// `3 Mar - 9 Mar 2025`
pub fn format_week_range(date: NaiveDate) -> Result<String> {
    let week = week_dates(date)?;
    Ok(format!(
        "{} - {}",
        week[0].format("%-d %b"),
        week[6].format("%-d %b %Y")
    ))
}

/// `March 2025`
pub fn format_month_year(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}
