//! Service error handling
//!
//! Repository and calculator failures are folded into one `ServiceError`,
//! which the batch runner renders as an `ErrorResponse` per failed item.

use nutriform_shared::{CalculationError, ErrorDetail, ErrorResponse, ValidationError};
use std::sync::PoisonError;
use thiserror::Error;
use tracing::error;

/// Storage-layer errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Lock error: {0}")]
    Lock(String),
}

impl<T> From<PoisonError<T>> for RepositoryError {
    fn from(error: PoisonError<T>) -> Self {
        RepositoryError::Lock(error.to_string())
    }
}

/// Service error type
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationError),

    #[error("Storage error")]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "VALIDATION_ERROR",
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::Conflict(_) => "CONFLICT",
            ServiceError::Calculation(CalculationError::MissingPatientContext(_)) => {
                "MISSING_PATIENT_CONTEXT"
            }
            ServiceError::Calculation(_) => "CALCULATION_ERROR",
            ServiceError::Repository(_) => "STORAGE_ERROR",
        }
    }

    /// Render as an error body; storage details are logged, not returned
    pub fn to_response(&self) -> ErrorResponse {
        let (message, field) = match self {
            ServiceError::Validation(err) => (err.user_message(), Some(err.field.clone())),
            ServiceError::NotFound(msg) | ServiceError::Conflict(msg) => (msg.clone(), None),
            ServiceError::Calculation(err) => (err.to_string(), None),
            ServiceError::Repository(err) => {
                error!("Storage error: {:?}", err);
                ("A storage error occurred".to_string(), None)
            }
        };

        ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
                field,
            },
        }
    }
}

/// Result type alias for services
pub type ServiceResult<T> = Result<T, ServiceError>;
