//! Error types for the board server

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shared::{ErrorBody, InvalidField, OrderingError};
use thiserror::Error;

/// Result type for board operations
pub type Result<T> = std::result::Result<T, KanbanError>;

#[derive(Debug, Error)]
pub enum KanbanError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Referenced entity does not exist
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: i64 },

    /// Underlying store failure
    #[error("persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KanbanError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(resource: &'static str, id: i64) -> Self {
        Self::NotFound { resource, id }
    }

    pub fn board_not_found(id: i64) -> Self {
        Self::not_found("board", id)
    }

    pub fn list_not_found(id: i64) -> Self {
        Self::not_found("list", id)
    }

    pub fn task_not_found(id: i64) -> Self {
        Self::not_found("task", id)
    }

    pub fn attachment_not_found(id: i64) -> Self {
        Self::not_found("attachment", id)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Persistence(_) | Self::Io(_) | Self::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Map an ordering failure inside `resource`'s scope.
    pub fn from_ordering(resource: &'static str, err: OrderingError) -> Self {
        match err {
            OrderingError::UnknownMember(id) => Self::not_found(resource, id),
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<InvalidField> for KanbanError {
    fn from(err: InvalidField) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<JsonRejection> for KanbanError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for KanbanError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<MultipartError> for KanbanError {
    fn from(err: MultipartError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl IntoResponse for KanbanError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KanbanError::task_not_found(7);
        assert_eq!(err.to_string(), "task not found: 7");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_ordering_errors_map_by_kind() {
        let unknown = KanbanError::from_ordering("task", OrderingError::UnknownMember(3));
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

        let missing = KanbanError::from_ordering("task", OrderingError::MissingMember(3));
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let full = KanbanError::from_ordering("task", OrderingError::PositionOverflow(i64::MAX));
        assert_eq!(full.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invalid_field_is_validation() {
        let err: KanbanError = InvalidField::new("name", "must not be empty").into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "name: must not be empty");
    }
}
