//! Shared library for the calendar Lambda functions.
//!
//! This crate provides the domain model, storage seams, the calendar and
//! reminder logic, and the HTTP/config plumbing used across all Lambdas.

pub mod auth;
pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod reminder;
pub mod secrets;
pub mod store;

pub use calendar::{month_grid, place_events, CalendarGrid, DayCell, WeekStart};
pub use config::Config;
pub use error::{Error, Result};
pub use models::{Account, Event, NewEvent};
pub use reminder::{Notifier, NotificationPermission, Reminder, ReminderScanner};
pub use store::{AccountStore, EventStore, MemoryStore, Store};
