//! Account endpoints.
//!
//! Endpoints:
//! - POST /register - Create an account
//! - POST /login - Check credentials

use std::sync::Arc;

use lambda_http::{Body, Error, Request, Response};
use serde::Deserialize;
use shared::http::{error_response, json_response, parse_json_body, route_path};
use shared::models::AccountResponse;
use shared::{auth, Result};
use tracing::info;
use validator::Validate;

use crate::{respond, validation_error, AppState};

/// Register/login request
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[serde(default)]
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(
        min = 6,
        message = "Password must be at least 6 characters long"
    ))]
    pub password: String,
}

impl CredentialsRequest {
    fn require_fields(&mut self) -> Result<()> {
        self.email = self.email.trim().to_string();
        if self.email.is_empty() || self.password.is_empty() {
            return Err(shared::Error::Validation(
                "Email and password are required".to_string(),
            ));
        }
        Ok(())
    }

    /// Reject domains without a dot, such as `a@localhost`.
    fn require_dotted_domain(&self) -> Result<()> {
        let dotted = self
            .email
            .rsplit_once('@')
            .map(|(_, domain)| {
                domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
            })
            .unwrap_or(false);
        if !dotted {
            return Err(shared::Error::Validation(
                "Please enter a valid email address".to_string(),
            ));
        }
        Ok(())
    }
}

async fn register(state: &AppState, event: &Request) -> Result<Response<Body>> {
    let mut request: CredentialsRequest = parse_json_body(event.body())?;
    request.require_fields()?;
    request.validate().map_err(|e| validation_error(&e))?;
    request.require_dotted_domain()?;

    let account = auth::register(state.store.as_ref(), &request.email, &request.password).await?;
    info!(account_id = %account.id, "New account registered");

    json_response(
        201,
        &AccountResponse::from(&account),
        &state.config.allowed_origin,
    )
}

async fn login(state: &AppState, event: &Request) -> Result<Response<Body>> {
    let mut request: CredentialsRequest = parse_json_body(event.body())?;
    request.require_fields()?;

    let account = auth::login(state.store.as_ref(), &request.email, &request.password).await?;
    info!(account_id = %account.id, "Account logged in");

    json_response(
        200,
        &AccountResponse::from(&account),
        &state.config.allowed_origin,
    )
}

pub async fn handler(state: Arc<AppState>, event: Request) -> std::result::Result<Response<Body>, Error> {
    let method = event.method().as_str();
    let path = route_path(event.uri().path());

    info!("Accounts request: {} {}", method, path);

    let result = match (method, path) {
        ("POST", "/register") => register(&state, &event).await,
        ("POST", "/login") => login(&state, &event).await,
        _ => error_response(404, "Not found", &state.config.allowed_origin),
    };

    respond(&state, result)
}
