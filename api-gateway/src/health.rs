//! Liveness probe. Does not touch the database.

use std::sync::Arc;

use lambda_http::{Body, Error, Request, Response};
use serde::Serialize;
use shared::http::{error_response, error_to_response, json_response, route_path};
use shared::Config;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

pub async fn handler(config: Arc<Config>, event: Request) -> Result<Response<Body>, Error> {
    let result = match (event.method().as_str(), route_path(event.uri().path())) {
        ("GET", "/health") => json_response(
            200,
            &HealthResponse {
                status: "ok",
                message: "Server is running",
            },
            &config.allowed_origin,
        ),
        _ => error_response(404, "Not found", &config.allowed_origin),
    };

    match result {
        Ok(response) => Ok(response),
        Err(e) => Ok(error_to_response(&e, &config.allowed_origin)?),
    }
}
