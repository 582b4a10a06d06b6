//! Translation of domain failures into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::error;

use crate::backend::domain::ServiceError;
use shared::ErrorResponse;

pub const LOAD_ERROR: &str = "Error loading data.";
pub const SAVE_ERROR: &str = "Error saving.";

/// Whether the failed request was reading or writing; picks the storage message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.into(),
                detail,
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message, None)
    }

    /// Map a service failure, logging it on the way out
    pub fn from_service(err: ServiceError, access: Access, context: &str) -> Self {
        error!("{}: {}", context, err);
        match err {
            ServiceError::Validation(message) => Self::new(StatusCode::BAD_REQUEST, message, None),
            ServiceError::Forbidden(message) => Self::new(StatusCode::FORBIDDEN, message, None),
            ServiceError::InvalidTransition(message) => Self::new(StatusCode::CONFLICT, message, None),
            not_found @ ServiceError::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, not_found.to_string(), None)
            }
            ServiceError::Storage(cause) => {
                let message = match access {
                    Access::Read => LOAD_ERROR,
                    Access::Write => SAVE_ERROR,
                };
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, Some(format!("{:#}", cause)))
            }
        }
    }

    pub fn read(err: ServiceError, context: &str) -> Self {
        Self::from_service(err, Access::Read, context)
    }

    pub fn write(err: ServiceError, context: &str) -> Self {
        Self::from_service(err, Access::Write, context)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServiceError::validation("bad"), StatusCode::BAD_REQUEST),
            (ServiceError::Forbidden("no".to_string()), StatusCode::FORBIDDEN),
            (ServiceError::not_found("animal", "a1"), StatusCode::NOT_FOUND),
            (ServiceError::InvalidTransition("done".to_string()), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::write(err, "test").status, status);
        }
    }

    #[test]
    fn test_storage_message_depends_on_access() {
        let read = ApiError::read(anyhow::anyhow!("disk gone").into(), "test");
        assert_eq!(read.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(read.body.error, LOAD_ERROR);
        assert_eq!(read.body.detail.as_deref(), Some("disk gone"));

        let write = ApiError::write(anyhow::anyhow!("disk gone").into(), "test");
        assert_eq!(write.body.error, SAVE_ERROR);
    }
}
