//! REST handlers for the calendar API.
//!
//! Each resource is served by its own Lambda (see `src/bin`); the routing and
//! request handling live here so they can be exercised against
//! [`shared::MemoryStore`] in tests.

pub mod accounts;
pub mod calendar;
pub mod events;
pub mod health;

use std::sync::Arc;

use lambda_http::{Body, Error, Response};
use shared::db::PgStore;
use shared::http::error_to_response;
use shared::{Config, Store};
use uuid::Uuid;
use validator::ValidationErrors;

/// Application state shared by every invocation of a Lambda.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self { store, config }
    }

    /// Load config from the environment and connect to Postgres.
    pub async fn from_env() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let store = PgStore::connect(&config).await?;
        Ok(Self::new(Arc::new(store), config))
    }
}

/// Run a fallible route and render any error as a JSON response.
pub(crate) fn respond(
    state: &AppState,
    result: shared::Result<Response<Body>>,
) -> Result<Response<Body>, Error> {
    match result {
        Ok(response) => Ok(response),
        Err(e) => Ok(error_to_response(&e, &state.config.allowed_origin)?),
    }
}

/// Parse a path segment as an id, with a resource-specific message.
pub(crate) fn parse_id(raw: &str, what: &str) -> shared::Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| shared::Error::Validation(format!("Invalid {} ID", what)))
}

/// Flatten validator output into one message, ordered by field name.
pub(crate) fn validation_error(errors: &ValidationErrors) -> shared::Error {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let messages: Vec<String> = fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("Invalid {}", field),
            })
        })
        .collect();

    shared::Error::Validation(messages.join("; "))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use lambda_http::http;
    use lambda_http::Request;
    use shared::MemoryStore;

    pub fn state() -> Arc<AppState> {
        Arc::new(AppState::new(Arc::new(MemoryStore::new()), Config::default()))
    }

    pub fn request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request {
        let body = match body {
            Some(json) => Body::from(json.to_string()),
            None => Body::Empty,
        };
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(body)
            .unwrap()
    }

    pub fn json(response: &Response<Body>) -> serde_json::Value {
        serde_json::from_slice(response.body().as_ref()).unwrap()
    }
}
