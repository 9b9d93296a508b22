// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::services::WorkflowError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 204 No Content (an expected row was not found/produced)
    NoContent(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (external identity provider issues)
    BadGateway(String),

    // 503 Service Unavailable (retryable store failures)
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::NoContent(_) => 204,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::NoContent(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::BadGateway(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::NoContent(_) => "NO_CONTENT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn no_content(message: impl Into<String>) -> Self {
        ApiError::NoContent(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Workflow failures map onto stable status classes; internal detail is
// logged here and never reaches the client.
impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::BadRequest(msg) => ApiError::bad_request(msg),
            WorkflowError::Unauthorized(msg) => ApiError::unauthorized(msg),
            WorkflowError::Conflict(msg) => ApiError::conflict(msg),
            WorkflowError::NoContent(msg) => ApiError::no_content(msg),
            WorkflowError::Auth(crate::auth::AuthError::InvalidToken) => {
                ApiError::unauthorized("invalid token")
            }
            WorkflowError::Auth(err) => {
                // Issuance-side failure (missing secret etc), not the caller's fault
                tracing::error!("token issuance error: {}", err);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            // Acquire/IO timeouts are the driver telling us to come back
            // later; everything else is fatal for this request
            WorkflowError::Database(sqlx::Error::PoolTimedOut) => {
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            WorkflowError::Database(err) => {
                tracing::error!("database error: {}", err);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            WorkflowError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<crate::oauth::ProviderError> for ApiError {
    fn from(err: crate::oauth::ProviderError) -> Self {
        tracing::error!("identity provider error: {}", err);
        ApiError::bad_gateway("Identity provider unavailable")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // 204 carries no body
        if status == StatusCode::NO_CONTENT {
            return status.into_response();
        }

        (status, Json(self.to_json())).into_response()
    }
}
