//! API error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::decision::DecisionError;
use crate::quota::QuotaError;

/// A typed API error: status code plus a stable machine-readable kind.
///
/// Quota exhaustion gets its own kind (and carries `remaining`) so clients
/// can show "upgrade" instead of "try again".
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
    remaining: Option<u32>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining: Option<u32>,
}

impl ApiError {
    fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self { status, kind, message: message.into(), remaining: None }
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "Missing or invalid bearer token",
        )
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_input", message)
    }

    /// Internal fault; the detail is logged, never surfaced.
    fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "Internal server error",
        )
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub const fn kind(&self) -> &'static str {
        self.kind
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.kind,
            message: &self.message,
            remaining: self.remaining,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<DecisionError> for ApiError {
    fn from(e: DecisionError) -> Self {
        match e {
            DecisionError::InvalidInput(message) => Self::invalid_input(message),
            DecisionError::QuotaExceeded { remaining } => Self {
                status: StatusCode::TOO_MANY_REQUESTS,
                kind: "quota_exceeded",
                message: "Daily generation quota exhausted; premium removes the ceiling"
                    .to_string(),
                remaining: Some(remaining),
            },
            DecisionError::Forbidden => Self::new(
                StatusCode::FORBIDDEN,
                "forbidden",
                "Access to this decision is denied",
            ),
            DecisionError::NotFound(what) => {
                Self::new(StatusCode::NOT_FOUND, "not_found", format!("Not found: {what}"))
            }
            DecisionError::AlreadyResolved => Self::new(
                StatusCode::CONFLICT,
                "already_resolved",
                "Decision is already resolved",
            ),
            DecisionError::NotYetResolved => Self::new(
                StatusCode::CONFLICT,
                "not_yet_resolved",
                "Decision is not resolved yet",
            ),
            DecisionError::Serialization(err) => {
                error!(error = %err, "Serialization failure in decision operation");
                Self::internal()
            }
            DecisionError::Storage(err) => {
                error!(error = %err, "Storage failure in decision operation");
                Self::internal()
            }
        }
    }
}

impl From<QuotaError> for ApiError {
    fn from(e: QuotaError) -> Self {
        match e {
            QuotaError::UnknownUser(what) => {
                Self::new(StatusCode::NOT_FOUND, "not_found", format!("Not found: {what}"))
            }
            QuotaError::Storage(err) => {
                error!(error = %err, "Storage failure in quota operation");
                Self::internal()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_exceeded_maps_to_429_with_remaining() {
        let api: ApiError = DecisionError::QuotaExceeded { remaining: 0 }.into();
        assert_eq!(api.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(api.kind(), "quota_exceeded");
        assert_eq!(api.remaining, Some(0));
    }

    #[test]
    fn state_machine_misuse_maps_to_conflict() {
        let api: ApiError = DecisionError::AlreadyResolved.into();
        assert_eq!(api.status(), StatusCode::CONFLICT);
        let api: ApiError = DecisionError::NotYetResolved.into();
        assert_eq!(api.status(), StatusCode::CONFLICT);
        assert_eq!(api.kind(), "not_yet_resolved");
    }

    #[test]
    fn storage_detail_is_not_surfaced() {
        let api: ApiError =
            DecisionError::Storage(crate::storage::DatabaseError::Query("secret table".into()))
                .into();
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.message.contains("secret"));
    }
}
