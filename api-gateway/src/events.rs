//! Events API - create, list and delete calendar events.
//!
//! Endpoints:
//! - POST /events - Create an event
//! - GET /events/{owner} - List an owner's events, ascending by date
//! - DELETE /events/{id} - Delete an event

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lambda_http::{Body, Error, Request, Response};
use serde::Deserialize;
use shared::http::{error_response, json_response, parse_json_body, route_path};
use shared::models::NewEvent;
use shared::{AccountStore, EventStore, Result};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{parse_id, respond, validation_error, AppState};

/// Create event request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[serde(alias = "userId")]
    pub owner: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    #[serde(alias = "reminderOffsetMinutes")]
    #[validate(range(min = 0, message = "reminderTime must not be negative"))]
    pub reminder_time: Option<i32>,
}

impl CreateEventRequest {
    fn into_new_event(self) -> Result<NewEvent> {
        let missing = || shared::Error::Validation("Missing required fields".to_string());

        let owner = self.owner.ok_or_else(missing)?;
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(missing)?;
        let date = self.date.ok_or_else(missing)?;

        let date = DateTime::parse_from_rfc3339(date.trim())
            .map_err(|_| shared::Error::Validation("Invalid date".to_string()))?
            .with_timezone(&Utc);

        Ok(NewEvent {
            owner: parse_id(&owner, "user")?,
            title,
            description: self.description.unwrap_or_default(),
            date,
            reminder_offset_minutes: self.reminder_time.unwrap_or(0),
        })
    }
}

async fn ensure_owner(state: &AppState, owner: Uuid) -> Result<()> {
    match state.store.find_account(owner).await? {
        Some(_) => Ok(()),
        None => Err(shared::Error::Auth("User not found".to_string())),
    }
}

async fn create_event(state: &AppState, event: &Request) -> Result<Response<Body>> {
    let request: CreateEventRequest = parse_json_body(event.body())?;
    request.validate().map_err(|e| validation_error(&e))?;
    let new_event = request.into_new_event()?;

    ensure_owner(state, new_event.owner).await?;
    let created = state.store.insert_event(new_event.into_event()).await?;
    info!(event_id = %created.id, owner = %created.owner, "Event created");

    json_response(201, &created, &state.config.allowed_origin)
}

async fn list_events(state: &AppState, owner: &str) -> Result<Response<Body>> {
    let owner = parse_id(owner, "user")?;
    ensure_owner(state, owner).await?;

    let events = state.store.list_events(owner).await?;
    json_response(200, &events, &state.config.allowed_origin)
}

async fn delete_event(state: &AppState, event_id: &str) -> Result<Response<Body>> {
    let id = parse_id(event_id, "event")?;

    if !state.store.delete_event(id).await? {
        return Err(shared::Error::NotFound("Event not found".to_string()));
    }
    info!(event_id = %id, "Event deleted");

    json_response(
        200,
        &serde_json::json!({
            "message": "Event deleted successfully",
            "eventId": id,
        }),
        &state.config.allowed_origin,
    )
}

pub async fn handler(state: Arc<AppState>, event: Request) -> std::result::Result<Response<Body>, Error> {
    let method = event.method().as_str();
    let path = route_path(event.uri().path());

    info!("Events request: {} {}", method, path);

    let result = match (method, path) {
        ("POST", "/events") => create_event(&state, &event).await,
        ("GET", _) if path.starts_with("/events/") => {
            list_events(&state, path.trim_start_matches("/events/")).await
        }
        ("DELETE", _) if path.starts_with("/events/") => {
            delete_event(&state, path.trim_start_matches("/events/")).await
        }
        _ => error_response(404, "Not found", &state.config.allowed_origin),
    };

    respond(&state, result)
}
