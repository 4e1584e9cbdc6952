use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::booking::error::BookingError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub timestamp: DateTime<Utc>,
    pub code: String,
    pub message: String,
    pub details: String,
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(&'static str, String),
    Forbidden(&'static str, String),
    BadRequest(&'static str, String),
    NotFound(&'static str, String),
    Conflict(&'static str, String),
    CapacityExceeded(String),
    Internal(String),
}

impl ApiError {
    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized("INVALID_CREDENTIALS", "Username or password is incorrect".into())
    }

    pub fn session_expired() -> Self {
        ApiError::Unauthorized("SESSION_EXPIRED", "Session expired".into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::BadRequest("VALIDATION_ERROR", message.into())
    }

    fn parts(&self) -> (StatusCode, &str, &str, &'static str) {
        match self {
            ApiError::Unauthorized(code, msg) => {
                (StatusCode::UNAUTHORIZED, *code, msg.as_str(), "Authentication is required")
            }
            ApiError::Forbidden(code, msg) => {
                (StatusCode::FORBIDDEN, *code, msg.as_str(), "Caller is not allowed to perform this action")
            }
            ApiError::BadRequest(code, msg) => {
                (StatusCode::BAD_REQUEST, *code, msg.as_str(), "Invalid request parameters")
            }
            ApiError::NotFound(code, msg) => {
                (StatusCode::NOT_FOUND, *code, msg.as_str(), "Referenced resource does not exist")
            }
            ApiError::Conflict(code, msg) => {
                (StatusCode::CONFLICT, *code, msg.as_str(), "Request conflicts with existing data")
            }
            ApiError::CapacityExceeded(msg) => (
                StatusCode::CONFLICT,
                "DOCTOR_OVERLOADED",
                msg.as_str(),
                "Doctor has reached the maximum number of appointments for that day",
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                msg.as_str(),
                "Unexpected server error",
            ),
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::InvalidRequest(msg) => ApiError::BadRequest("VALIDATION_ERROR", msg),
            BookingError::NotFound(msg) => ApiError::NotFound("NOT_FOUND", msg),
            e @ BookingError::CapacityExceeded => ApiError::CapacityExceeded(e.to_string()),
            BookingError::Conflict(msg) => ApiError::Conflict("CONFLICT", msg),
            BookingError::Storage(msg) => {
                tracing::error!(error = %msg, "storage failure");
                ApiError::Internal("db error".into())
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        BookingError::from(e).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();
        let body = ErrorResponse {
            timestamp: Utc::now(),
            code: code.to_string(),
            message: message.to_string(),
            details: details.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
