//! Shared data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. Immutable once created.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    /// Always stored trimmed and lowercased.
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(email: &str, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// Canonical form of an email address used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Public view of an account returned by register/login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountResponse {
    pub id: Uuid,
    pub email: String,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
        }
    }
}

/// A calendar event owned by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    #[sqlx(rename = "owner_id")]
    pub owner: Uuid,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    /// Minutes before `date` at which a reminder fires. Never negative.
    #[serde(rename = "reminderTime")]
    #[sqlx(rename = "reminder_minutes")]
    pub reminder_offset_minutes: i32,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating an event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub owner: Uuid,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub reminder_offset_minutes: i32,
}

impl NewEvent {
    /// Assign an identifier and creation time.
    pub fn into_event(self) -> Event {
        Event {
            id: Uuid::new_v4(),
            owner: self.owner,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            date: self.date,
            reminder_offset_minutes: self.reminder_offset_minutes,
            created_at: Utc::now(),
        }
    }
}
