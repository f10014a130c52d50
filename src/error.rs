use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::auth::repo::AccountError;
use crate::donations::tracker::TrackerError;

/// Error returned by every handler; rendered as `{ "error", "message" }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("{0}")]
    Busy(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "InvalidInput",
            ApiError::NotFound(_) => "NotFound",
            ApiError::InvalidTransition(_) => "InvalidTransition",
            ApiError::Busy(_) => "Busy",
            ApiError::Conflict(_) => "Conflict",
            ApiError::Unauthorized(_) => "Unauthorized",
            ApiError::Forbidden(_) => "Forbidden",
            ApiError::Internal(_) => "Internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidTransition(_) | ApiError::Busy(_) | ApiError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Logs the cause and hides it from the client.
    pub fn internal<E: std::fmt::Display>(e: E) -> Self {
        error!(error = %e, "internal error");
        ApiError::Internal("internal server error".into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<TrackerError> for ApiError {
    fn from(e: TrackerError) -> Self {
        match e {
            TrackerError::InvalidInput(_) => ApiError::InvalidInput(e.to_string()),
            TrackerError::NotFound(_) => ApiError::NotFound(e.to_string()),
            TrackerError::InvalidTransition { .. } => ApiError::InvalidTransition(e.to_string()),
            TrackerError::Busy { .. } => ApiError::Busy(e.to_string()),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::EmailTaken => ApiError::Conflict("Email already registered".into()),
            AccountError::UnknownUser(_) => ApiError::Unauthorized("User not found".into()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::InvalidInput(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::InvalidInput(e.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(e: PathRejection) -> Self {
        ApiError::InvalidInput(e.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::donations::repo_types::DonationStatus;
    use uuid::Uuid;

    #[test]
    fn tracker_errors_map_to_statuses() {
        let id = Uuid::new_v4();
        let cases = [
            (TrackerError::InvalidInput("x".into()), StatusCode::BAD_REQUEST, "InvalidInput"),
            (TrackerError::NotFound(id), StatusCode::NOT_FOUND, "NotFound"),
            (
                TrackerError::InvalidTransition {
                    id,
                    from: DonationStatus::Collected,
                    to: DonationStatus::Accepted,
                },
                StatusCode::CONFLICT,
                "InvalidTransition",
            ),
            (TrackerError::Busy { in_flight: id }, StatusCode::CONFLICT, "Busy"),
        ];
        for (err, status, kind) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status(), status);
            assert_eq!(api.kind(), kind);
        }
    }

    #[test]
    fn internal_hides_cause() {
        let err = ApiError::internal("db password is hunter2");
        assert_eq!(err.to_string(), "internal server error");
    }
}
