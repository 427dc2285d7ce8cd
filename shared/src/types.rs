//! Request and response types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::activity::FrequencyCategory;
use crate::formulas::Sex;
use crate::metrics::AnthropometricSample;
use crate::models::QuestionnaireType;
use crate::validation::{circumference_rule, days_per_week_rule, met_minutes_rule};

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

// ============================================================================
// Patients and Anthropometry
// ============================================================================

/// New patient
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PatientCreate {
    #[validate(length(min = 1, max = 255, message = "Full name must be 1-255 characters"))]
    pub full_name: String,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub sex: Option<Sex>,
    #[validate(length(max = 255, message = "Place of residence is too long"))]
    #[serde(default)]
    pub place_of_residence: String,
}

/// New anthropometry measurement
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnthropometryCreate {
    #[validate(range(min = 50.0, max = 300.0, message = "Height must be between 50 and 300 cm"))]
    pub height_cm: f64,
    #[validate(range(min = 20.0, max = 500.0, message = "Weight must be between 20 and 500 kg"))]
    pub weight_kg: f64,
    #[serde(default = "Utc::now")]
    pub measured_at: DateTime<Utc>,
    #[validate(custom(function = "circumference_rule"))]
    #[serde(default)]
    pub waist_cm: Option<f64>,
    #[validate(custom(function = "circumference_rule"))]
    #[serde(default)]
    pub hip_cm: Option<f64>,
}

impl AnthropometryCreate {
    pub fn into_sample(self) -> AnthropometricSample {
        AnthropometricSample {
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            measured_at: self.measured_at,
            waist_cm: self.waist_cm,
            hip_cm: self.hip_cm,
        }
    }
}

// ============================================================================
// Questionnaires
// ============================================================================

/// Answer to one question of a submission
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnswerCreate {
    pub question_id: i64,
    #[validate(custom(function = "days_per_week_rule"))]
    #[serde(default)]
    pub days_per_week: Option<i32>,
    #[validate(custom(function = "met_minutes_rule"))]
    #[serde(default)]
    pub met_minutes: Option<f64>,
    #[serde(default)]
    pub frequency: Option<FrequencyCategory>,
}

/// New questionnaire submission with its answers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionCreate {
    pub questionnaire_type: QuestionnaireType,
    #[serde(default)]
    pub answers: Vec<AnswerCreate>,
}

/// Submission response with its aggregate score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionSummary {
    pub submission_id: Uuid,
    pub patient_id: i64,
    pub questionnaire_type: QuestionnaireType,
    pub answer_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_met_minutes: Option<f64>,
}

// ============================================================================
// Doctor Views
// ============================================================================

/// Filters for searching a doctor's patients; unset or empty filters match all
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientSearch {
    /// Case-insensitive substring of the full name
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
}

impl PatientSearch {
    pub fn matches(&self, patient: &crate::models::Patient) -> bool {
        let name_ok = match self.full_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => patient
                .full_name
                .to_lowercase()
                .contains(&name.to_lowercase()),
            _ => true,
        };
        let birth_ok = self.birth_date.map_or(true, |d| patient.birth_date == d);
        name_ok && birth_ok
    }
}

/// Which patients a statistics request covers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatsScope {
    /// Patients actively linked to the doctor
    #[default]
    Linked,
    /// Every patient in the store
    All,
}

// ============================================================================
// Profile Change Requests
// ============================================================================

/// New profile change request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileChangeCreate {
    pub user_id: Uuid,
    pub requested_fields: serde_json::Value,
}

/// Review decision on a profile change request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approve,
    Reject,
}
