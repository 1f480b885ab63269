//! Database credentials from AWS Secrets Manager.

use std::collections::HashMap;
use std::sync::OnceLock;

use aws_sdk_secretsmanager::Client as SecretsClient;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{Error, Result};

const DEFAULT_PORT: u16 = 5432;

/// Parsed credentials per secret ARN, kept for the life of the container.
static CREDENTIALS: OnceLock<RwLock<HashMap<String, DatabaseCredentials>>> = OnceLock::new();

/// RDS-style credentials secret.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
}

impl DatabaseCredentials {
    /// Connection options, preferring values from the secret over the fallbacks.
    ///
    /// Fields are set individually so passwords with URL-reserved characters
    /// need no escaping.
    pub fn connect_options(
        &self,
        fallback_host: Option<&str>,
        fallback_db: &str,
    ) -> Result<PgConnectOptions> {
        let host = self
            .host
            .as_deref()
            .or(fallback_host)
            .ok_or_else(|| Error::Config("DB_HOST not set and secret has no host".to_string()))?;

        Ok(PgConnectOptions::new()
            .host(host)
            .port(self.port.unwrap_or(DEFAULT_PORT))
            .username(&self.username)
            .password(&self.password)
            .database(self.dbname.as_deref().unwrap_or(fallback_db)))
    }
}

/// Fetch and parse the credentials secret, at most once per ARN.
pub async fn get_database_credentials(
    client: &SecretsClient,
    secret_arn: &str,
) -> Result<DatabaseCredentials> {
    let cache = CREDENTIALS.get_or_init(|| RwLock::new(HashMap::new()));
    if let Some(creds) = cache.read().await.get(secret_arn) {
        return Ok(creds.clone());
    }

    let response = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| Error::Aws(format!("Failed to get DB secret: {}", e)))?;
    let raw = response
        .secret_string()
        .ok_or_else(|| Error::Aws("DB secret has no string value".to_string()))?;

    let creds: DatabaseCredentials = serde_json::from_str(raw)
        .map_err(|e| Error::Aws(format!("Failed to parse database credentials: {}", e)))?;
    debug!(secret_arn, "Loaded database credentials");

    cache
        .write()
        .await
        .insert(secret_arn.to_string(), creds.clone());
    Ok(creds)
}
