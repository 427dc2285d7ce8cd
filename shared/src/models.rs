//! Data models for the Nutriform records service

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::activity::{FrequencyCategory, QuestionRef, QuestionnaireAnswer};
use crate::formulas::Sex;
use crate::metrics::{AnthropometricSample, DerivedBodyMetrics, PatientContext};

/// Patient record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: i64,
    pub full_name: String,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub sex: Option<Sex>,
    pub place_of_residence: String,
}

impl Patient {
    /// Calculator context, if the patient's sex is on record
    pub fn context(&self) -> Option<PatientContext> {
        self.sex.map(|sex| PatientContext {
            birth_date: self.birth_date,
            sex,
        })
    }
}

/// Stored anthropometry measurement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Anthropometry {
    pub id: Uuid,
    pub patient_id: i64,
    #[serde(flatten)]
    pub sample: AnthropometricSample,
}

/// Derived metrics stored one-to-one with an anthropometry record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BodyMetricsRecord {
    pub id: Uuid,
    pub anthropometry_id: Uuid,
    pub patient_id: i64,
    #[serde(flatten)]
    pub metrics: DerivedBodyMetrics,
    pub calculated_at: DateTime<Utc>,
}

// ============================================================================
// Questionnaires
// ============================================================================

/// Questionnaire type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionnaireType {
    Nutrition,
    PhysicalActivity,
}

/// Question of a questionnaire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: i64,
    pub questionnaire_type: QuestionnaireType,
    pub question_text: String,
    #[serde(default)]
    pub question_order: Option<i32>,
}

impl Question {
    pub fn to_question_ref(&self) -> QuestionRef {
        QuestionRef {
            text: self.question_text.clone(),
            display_order: self.question_order,
        }
    }
}

/// One pass of a patient through a questionnaire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Submission {
    pub id: Uuid,
    pub patient_id: i64,
    pub questionnaire_type: QuestionnaireType,
    pub submitted_at: DateTime<Utc>,
    /// Weekly MET-minutes, recomputed whenever the answers change
    #[serde(default)]
    pub total_met_minutes: Option<f64>,
}

/// Stored answer of a submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    pub id: i64,
    pub submission_id: Uuid,
    pub question_id: i64,
    #[serde(default)]
    pub days_per_week: Option<i32>,
    #[serde(default)]
    pub met_minutes: Option<f64>,
    #[serde(default)]
    pub frequency: Option<FrequencyCategory>,
}

impl Answer {
    /// Join with its question for aggregation
    pub fn with_question(&self, question: Option<&Question>) -> QuestionnaireAnswer {
        QuestionnaireAnswer {
            question: question.map(Question::to_question_ref),
            days_per_week: self.days_per_week,
            met_minutes: self.met_minutes,
            frequency: self.frequency,
        }
    }
}

// ============================================================================
// Doctor-Patient Links
// ============================================================================

/// Whether a doctor currently follows a patient
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Active,
    Inactive,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Active => "active",
            LinkStatus::Inactive => "inactive",
        }
    }
}

/// Link between a doctor and a patient, keyed by the pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientLink {
    pub doctor_id: Uuid,
    pub patient_id: i64,
    pub added_at: DateTime<Utc>,
    pub status: LinkStatus,
}

/// Aggregate figures over a doctor's patients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PatientStats {
    pub total_patients: usize,
    /// Mean of full years of age; `None` without patients
    pub average_age: Option<f64>,
    /// Mean BMI over every computed measurement; `None` without any
    pub average_bmi: Option<f64>,
    pub total_surveys: usize,
}

// ============================================================================
// Profile Change Workflow
// ============================================================================

/// Review status of a profile change request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl ChangeRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeRequestStatus::Pending => "pending",
            ChangeRequestStatus::Approved => "approved",
            ChangeRequestStatus::Rejected => "rejected",
        }
    }
}

/// Patient's request to change profile fields, reviewed by an administrator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileChangeRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub requested_fields: serde_json::Value,
    pub status: ChangeRequestStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub reviewed_by: Option<Uuid>,
}

/// In-app notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: i64,
    pub user_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}
