//! Database connection management and the Postgres-backed store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::models::{Account, Event};
use crate::secrets::get_database_credentials;
use crate::store::{AccountStore, EventStore};
use crate::{Config, Error, Result};

const CREATE_ACCOUNTS: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id UUID PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_EVENTS: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id UUID PRIMARY KEY,
    owner_id UUID NOT NULL REFERENCES accounts(id),
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    date TIMESTAMPTZ NOT NULL,
    reminder_minutes INTEGER NOT NULL DEFAULT 0 CHECK (reminder_minutes >= 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_EVENTS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS events_owner_date_idx ON events (owner_id, date)";

/// Resolve connection options from config, fetching credentials if needed.
pub async fn connect_options(config: &Config) -> Result<PgConnectOptions> {
    if let Some(url) = &config.database_url {
        return url
            .parse::<PgConnectOptions>()
            .map_err(|e| Error::Config(format!("Invalid DATABASE_URL: {}", e)));
    }

    let secret_arn = config
        .db_secret_arn
        .as_deref()
        .ok_or_else(|| Error::Config("Set DATABASE_URL or DB_SECRET_ARN".to_string()))?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let secrets_client = aws_sdk_secretsmanager::Client::new(&aws_config);
    let creds = get_database_credentials(&secrets_client, secret_arn).await?;

    creds.connect_options(config.db_host.as_deref(), &config.db_name)
}

/// Create a database connection pool.
pub async fn create_pool(config: &Config) -> Result<PgPool> {
    let options = connect_options(config).await?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await
        .map_err(Error::Database)?;

    Ok(pool)
}

/// Create tables and indexes if they are missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in [CREATE_ACCOUNTS, CREATE_EVENTS, CREATE_EVENTS_INDEX] {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema ready");
    Ok(())
}

/// Postgres implementation of the account and event stores.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect using `config` and make sure the schema exists.
    pub async fn connect(config: &Config) -> Result<Self> {
        let pool = create_pool(config).await?;
        ensure_schema(&pool).await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn insert_account(&self, account: Account) -> Result<Account> {
        let result = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.created_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(Error::Validation("Email already exists".to_string()))
            }
            Err(e) => Err(Error::Database(e)),
        }
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, email, password_hash, created_at FROM accounts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, email, password_hash, created_at FROM accounts WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn insert_event(&self, event: Event) -> Result<Event> {
        let result = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (
                id, owner_id, title, description, date, reminder_minutes, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING
                id, owner_id, title, description, date, reminder_minutes, created_at
            "#,
        )
        .bind(event.id)
        .bind(event.owner)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(event.reminder_offset_minutes)
        .bind(event.created_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                Err(Error::Auth("User not found".to_string()))
            }
            Err(e) => Err(Error::Database(e)),
        }
    }

    async fn list_events(&self, owner: Uuid) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, owner_id, title, description, date, reminder_minutes, created_at
            FROM events
            WHERE owner_id = $1
            ORDER BY date ASC, created_at ASC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn delete_event(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_reminder_candidates(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, owner_id, title, description, date, reminder_minutes, created_at
            FROM events
            WHERE date - make_interval(mins => reminder_minutes) >= $1
            AND date - make_interval(mins => reminder_minutes) < $2
            ORDER BY date ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }
}
