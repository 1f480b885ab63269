//! Calendar API - month view with events placed on their days.
//!
//! Endpoints:
//! - GET /calendar/{owner}?month=YYYY-MM&weekStart=sunday|monday&tz=Area/City

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use lambda_http::{Body, Error, Request, Response};
use serde::{Deserialize, Serialize};
use shared::calendar::{month_grid, place_events, DayCell, WeekStart};
use shared::http::{error_response, json_response, route_path};
use shared::{AccountStore, EventStore, Result};
use tracing::info;

use crate::{parse_id, respond, AppState};

/// Query string of the month view
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarQuery {
    month: Option<String>,
    week_start: Option<WeekStart>,
    tz: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalendarResponse<'a> {
    year: i32,
    month: u32,
    week_start: WeekStart,
    time_zone: String,
    cells: Vec<DayCell<'a>>,
}

fn parse_month(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d")
        .map_err(|_| shared::Error::Validation("Invalid month, expected YYYY-MM".to_string()))
}

async fn month_view(state: &AppState, event: &Request, owner: &str) -> Result<Response<Body>> {
    let owner = parse_id(owner, "user")?;
    let query: CalendarQuery = serde_urlencoded::from_str(event.uri().query().unwrap_or(""))
        .map_err(|e| shared::Error::Validation(format!("Invalid query: {}", e)))?;

    let tz: Tz = match &query.tz {
        Some(name) => name
            .parse()
            .map_err(|_| shared::Error::Validation(format!("Unknown time zone '{}'", name)))?,
        None => state.config.display_timezone,
    };
    let week_start = query.week_start.unwrap_or(state.config.week_start);
    let reference = match &query.month {
        Some(month) => parse_month(month)?,
        None => Utc::now().with_timezone(&tz).date_naive(),
    };

    if state.store.find_account(owner).await?.is_none() {
        return Err(shared::Error::Auth("User not found".to_string()));
    }
    let events = state.store.list_events(owner).await?;

    let grid = month_grid(reference, week_start);
    let cells = place_events(&grid, &events, &tz);
    info!(
        owner = %owner,
        year = grid.year,
        month = grid.month,
        events = events.len(),
        "Built month view"
    );

    json_response(
        200,
        &CalendarResponse {
            year: grid.year,
            month: grid.month,
            week_start,
            time_zone: tz.name().to_string(),
            cells,
        },
        &state.config.allowed_origin,
    )
}

pub async fn handler(state: Arc<AppState>, event: Request) -> std::result::Result<Response<Body>, Error> {
    let method = event.method().as_str();
    let path = route_path(event.uri().path());

    info!("Calendar request: {} {}", method, path);

    let result = match (method, path) {
        ("GET", _) if path.starts_with("/calendar/") => {
            month_view(&state, &event, path.trim_start_matches("/calendar/")).await
        }
        _ => error_response(404, "Not found", &state.config.allowed_origin),
    };

    respond(&state, result)
}
