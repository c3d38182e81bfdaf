#![forbid(unsafe_code)]

use hub_core::news::{FieldError, ValidationErrors};
use hub_storage::StoreError;

/// Failure of a callable, surfaced to the caller with a stable machine-readable code.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CallableError {
    #[error("{message}")]
    InvalidArgument {
        message: String,
        field_errors: Vec<FieldError>,
        reason: Option<String>,
    },
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    PermissionDenied(String),
    /// The storage transaction could not commit; resubmitting the same request may succeed.
    #[error("{0}")]
    Aborted(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl CallableError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            field_errors: Vec::new(),
            reason: None,
        }
    }

    pub(crate) fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::Aborted(_) => "ABORTED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub(crate) fn is_retryable(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

impl From<ValidationErrors> for CallableError {
    fn from(value: ValidationErrors) -> Self {
        Self::InvalidArgument {
            message: value.to_string(),
            field_errors: value.0,
            reason: None,
        }
    }
}

impl From<StoreError> for CallableError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(err) => {
                Self::Aborted(format!("transaction aborted, please retry: {err}"))
            }
            StoreError::InvalidInput(message) => Self::invalid(format!("Invalid input: {message}")),
            StoreError::UnknownId => Self::NotFound("Unknown news id".to_string()),
            err @ (StoreError::Io(_) | StoreError::Sql(_)) => Self::Internal(err.to_string()),
        }
    }
}
