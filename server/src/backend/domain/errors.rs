use thiserror::Error;

/// Failure of a command handler
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        ServiceError::NotFound { kind, id: id.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
