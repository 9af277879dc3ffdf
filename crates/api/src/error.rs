//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use delivery::DeliveryError;
use domain::DomainError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Delivery pipeline error.
    Delivery(DeliveryError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Delivery(err) => delivery_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::CustomerNotFound(_) | DomainError::SegmentNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        DomainError::EmailAlreadyExists(_) => (StatusCode::CONFLICT, err.to_string()),
        DomainError::NegativeAmount(_) | DomainError::EmptyRuleSet => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        DomainError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn delivery_error_to_response(err: DeliveryError) -> (StatusCode, String) {
    match &err {
        DeliveryError::SegmentNotFound(_) | DeliveryError::RecordNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        DeliveryError::Channel(_) => (StatusCode::BAD_GATEWAY, err.to_string()),
        DeliveryError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<DeliveryError> for ApiError {
    fn from(err: DeliveryError) -> Self {
        ApiError::Delivery(err)
    }
}
