//! HTTP helpers for Lambda functions.

use lambda_http::{Body, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

use crate::{Error, Result};

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(
    status: u16,
    data: &T,
    allowed_origin: &str,
) -> Result<Response<Body>> {
    let json = serde_json::to_string(data)?;
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", allowed_origin)
        .body(Body::from(json))
        .map_err(|e| Error::Internal(format!("Failed to build response: {}", e)))
}

/// Create an error response with the given status code and message.
pub fn error_response(
    status: u16,
    message: impl Into<String>,
    allowed_origin: &str,
) -> Result<Response<Body>> {
    json_response(
        status,
        &ErrorBody {
            error: message.into(),
        },
        allowed_origin,
    )
}

/// Turn a handler error into its JSON response.
///
/// Server-side failures are logged and reported with a generic message.
pub fn error_to_response(err: &Error, allowed_origin: &str) -> Result<Response<Body>> {
    if err.is_client_error() {
        return error_response(err.status_code(), err.to_string(), allowed_origin);
    }
    error!(error = %err, "Request failed");
    error_response(err.status_code(), "Internal server error", allowed_origin)
}

/// Parse request body as JSON, mapping failures to a validation error.
pub fn parse_json_body<T: DeserializeOwned>(body: &Body) -> Result<T> {
    serde_json::from_slice(body.as_ref())
        .map_err(|e| Error::Validation(format!("Invalid request body: {}", e)))
}

/// Strip the `/api` stage prefix that API Gateway leaves in the path.
pub fn route_path(raw_path: &str) -> &str {
    raw_path.strip_prefix("/api").unwrap_or(raw_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_route_path() {
        assert_eq!(route_path("/api/events/abc"), "/events/abc");
        assert_eq!(route_path("/events"), "/events");
    }

    #[test]
    fn test_error_response_hides_internal_details() {
        let response =
            error_to_response(&Error::Internal("pool exhausted".to_string()), "*").unwrap();
        assert_eq!(response.status(), 500);
        let body: serde_json::Value = serde_json::from_slice(response.body().as_ref()).unwrap();
        assert_eq!(body["error"], "Internal server error");

        let response =
            error_to_response(&Error::NotFound("Event not found".to_string()), "*").unwrap();
        assert_eq!(response.status(), 404);
        assert_eq!(response.headers()["Access-Control-Allow-Origin"], "*");
        let body: serde_json::Value = serde_json::from_slice(response.body().as_ref()).unwrap();
        assert_eq!(body["error"], "Event not found");
    }

    #[test]
    fn test_parse_json_body_reports_validation() {
        #[derive(Debug, Deserialize)]
        struct Payload {
            #[allow(dead_code)]
            email: String,
        }
        let err = parse_json_body::<Payload>(&Body::from("{")).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
