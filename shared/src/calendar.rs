//! Month grid construction and placement of events into grid days.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate, TimeZone, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::Event;
use crate::Error;

/// Number of cells in a month view: six full weeks.
pub const GRID_CELLS: usize = 42;

/// Day a calendar week starts on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    #[serde(alias = "Sunday", alias = "sun")]
    Sunday,
    #[serde(alias = "Monday", alias = "mon")]
    Monday,
}

impl WeekStart {
    pub fn weekday(self) -> Weekday {
        match self {
            WeekStart::Sunday => Weekday::Sun,
            WeekStart::Monday => Weekday::Mon,
        }
    }
}

impl FromStr for WeekStart {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sunday" | "sun" => Ok(WeekStart::Sunday),
            "monday" | "mon" => Ok(WeekStart::Monday),
            other => Err(Error::Config(format!(
                "Invalid week start '{}'. Must be sunday or monday",
                other
            ))),
        }
    }
}

impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekStart::Sunday => write!(f, "sunday"),
            WeekStart::Monday => write!(f, "monday"),
        }
    }
}

/// The 42 consecutive days shown for one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarGrid {
    pub year: i32,
    pub month: u32,
    pub week_start: WeekStart,
    pub days: Vec<NaiveDate>,
}

impl CalendarGrid {
    /// Whether `date` belongs to the month this grid was built for.
    pub fn in_month(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.days.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.days.last().copied()
    }
}

/// Build the six-week grid for the month containing `reference`.
///
/// The grid starts on the last `week_start` weekday on or before the first of
/// the month. A month covers at most six week rows under either week start,
/// so 42 days always contain it.
pub fn month_grid(reference: NaiveDate, week_start: WeekStart) -> CalendarGrid {
    let first = reference - Days::new(u64::from(reference.day0()));
    let start_offset = (7 + first.weekday().num_days_from_monday()
        - week_start.weekday().num_days_from_monday())
        % 7;
    let start = first - Days::new(u64::from(start_offset));

    CalendarGrid {
        year: first.year(),
        month: first.month(),
        week_start,
        days: start.iter_days().take(GRID_CELLS).collect(),
    }
}

/// One grid day with the events that fall on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCell<'a> {
    pub date: NaiveDate,
    pub in_month: bool,
    pub events: Vec<&'a Event>,
}

/// Bucket `events` into the grid days, comparing dates in `tz`.
///
/// Each bucket is in ascending time order; equal times keep input order.
/// Events outside the grid window are left out.
pub fn place_events<'a, Tz: TimeZone>(
    grid: &CalendarGrid,
    events: &'a [Event],
    tz: &Tz,
) -> Vec<DayCell<'a>> {
    let mut cells: Vec<DayCell<'a>> = grid
        .days
        .iter()
        .map(|&date| DayCell {
            date,
            in_month: grid.in_month(date),
            events: Vec::new(),
        })
        .collect();

    let index: HashMap<NaiveDate, usize> = grid
        .days
        .iter()
        .enumerate()
        .map(|(i, &date)| (date, i))
        .collect();

    for event in events {
        let local_day = event.date.with_timezone(tz).date_naive();
        if let Some(&i) = index.get(&local_day) {
            cells[i].events.push(event);
        }
    }

    for cell in &mut cells {
        cell.events.sort_by_key(|e| e.date);
    }

    cells
}
