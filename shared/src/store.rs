//! Storage seams for accounts and events.
//!
//! The Lambdas talk to Postgres through [`crate::db::PgStore`]; tests and
//! local runs use [`MemoryStore`]. Both honour the same contracts:
//!
//! - account emails are unique (already normalized by the caller),
//! - `list_events` is sorted ascending by `date`, ties in insertion order,
//! - `delete_event` reports whether anything was removed.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Account, Event};
use crate::{Error, Result};

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account. Fails with a validation error on duplicate email.
    async fn insert_account(&self, account: Account) -> Result<Account>;

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>>;

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert_event(&self, event: Event) -> Result<Event>;

    /// All events of one owner, ascending by date.
    async fn list_events(&self, owner: Uuid) -> Result<Vec<Event>>;

    /// Returns `false` when no event had that id.
    async fn delete_event(&self, id: Uuid) -> Result<bool>;

    /// Events of every owner whose reminder time falls in `[from, to)`.
    async fn list_reminder_candidates(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>>;
}

/// Both stores behind one object, for handler state.
pub trait Store: AccountStore + EventStore {}

impl<T: AccountStore + EventStore> Store for T {}

#[derive(Default)]
struct MemoryState {
    accounts: HashMap<Uuid, Account>,
    events: Vec<Event>,
}

/// In-process store.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events across all owners.
    pub async fn event_count(&self) -> usize {
        self.state.read().await.events.len()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn insert_account(&self, account: Account) -> Result<Account> {
        let mut state = self.state.write().await;
        if state.accounts.values().any(|a| a.email == account.email) {
            return Err(Error::Validation("Email already exists".to_string()));
        }
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.state.read().await.accounts.get(&id).cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.values().find(|a| a.email == email).cloned())
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn insert_event(&self, event: Event) -> Result<Event> {
        let mut state = self.state.write().await;
        if !state.accounts.contains_key(&event.owner) {
            return Err(Error::Auth("User not found".to_string()));
        }
        state.events.push(event.clone());
        Ok(event)
    }

    async fn list_events(&self, owner: Uuid) -> Result<Vec<Event>> {
        let state = self.state.read().await;
        let mut events: Vec<Event> = state
            .events
            .iter()
            .filter(|e| e.owner == owner)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.date);
        Ok(events)
    }

    async fn delete_event(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.events.len();
        state.events.retain(|e| e.id != id);
        Ok(state.events.len() != before)
    }

    async fn list_reminder_candidates(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let state = self.state.read().await;
        let mut events: Vec<Event> = state
            .events
            .iter()
            .filter(|e| {
                let fire_at = e.date - Duration::minutes(i64::from(e.reminder_offset_minutes));
                fire_at >= from && fire_at < to
            })
            .cloned()
            .collect();
        events.sort_by_key(|e| e.date);
        Ok(events)
    }
}
