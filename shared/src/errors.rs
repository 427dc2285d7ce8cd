//! Error types for the Nutriform calculators

use thiserror::Error;

/// Errors raised by the body-metrics calculator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalculationError {
    /// The owning patient's age or sex could not be resolved for a sample
    #[error("Patient context missing: {0}")]
    MissingPatientContext(String),

    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(String),
}

/// Validation error with field context
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{display_label}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub display_label: String,
}

impl ValidationError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
            display_label: crate::validation::get_field_display_label(field).to_string(),
        }
    }

    /// Format as user-friendly error message
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}
