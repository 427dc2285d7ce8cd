//! Storage repositories
//!
//! Each trait is the persistence seam for one aggregate. `InMemoryStore`
//! implements all of them and is what the batch runner and tests use.

pub mod in_memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nutriform_shared::{
    Anthropometry, AnthropometricSample, Answer, BodyMetricsRecord, ChangeRequestStatus,
    DerivedBodyMetrics, FrequencyCategory, Notification, Patient, PatientCreate, PatientLink,
    ProfileChangeRequest, Question, QuestionnaireType, Submission,
};
use uuid::Uuid;

use crate::error::RepositoryError;

pub use in_memory::InMemoryStore;

/// Input for storing an answer
#[derive(Debug, Clone)]
pub struct CreateAnswer {
    pub question_id: i64,
    pub days_per_week: Option<i32>,
    pub met_minutes: Option<f64>,
    pub frequency: Option<FrequencyCategory>,
}

#[async_trait]
pub trait PatientRepository: Send + Sync {
    async fn create_patient(&self, input: PatientCreate) -> Result<Patient, RepositoryError>;

    async fn get_patient(&self, id: i64) -> Result<Option<Patient>, RepositoryError>;

    async fn list_patients(&self) -> Result<Vec<Patient>, RepositoryError>;
}

#[async_trait]
pub trait AnthropometryRepository: Send + Sync {
    async fn create_anthropometry(
        &self,
        patient_id: i64,
        sample: AnthropometricSample,
    ) -> Result<Anthropometry, RepositoryError>;

    async fn get_anthropometry(&self, id: Uuid) -> Result<Option<Anthropometry>, RepositoryError>;

    /// All samples of a patient, oldest first
    async fn list_anthropometry(&self, patient_id: i64)
        -> Result<Vec<Anthropometry>, RepositoryError>;
}

#[async_trait]
pub trait BodyMetricsRepository: Send + Sync {
    /// Insert or overwrite the metrics of one anthropometry record
    async fn upsert_body_metrics(
        &self,
        anthropometry: &Anthropometry,
        metrics: DerivedBodyMetrics,
        calculated_at: DateTime<Utc>,
    ) -> Result<BodyMetricsRecord, RepositoryError>;

    async fn get_body_metrics(
        &self,
        anthropometry_id: Uuid,
    ) -> Result<Option<BodyMetricsRecord>, RepositoryError>;

    /// Every metrics record of a patient, oldest calculation first
    async fn list_body_metrics(
        &self,
        patient_id: i64,
    ) -> Result<Vec<BodyMetricsRecord>, RepositoryError>;
}

#[async_trait]
pub trait PatientLinkRepository: Send + Sync {
    /// Create an active link, or reactivate an existing one
    async fn add_patient_link(
        &self,
        doctor_id: Uuid,
        patient_id: i64,
    ) -> Result<PatientLink, RepositoryError>;

    /// Mark a link inactive; `NotFound` when the pair was never linked
    async fn deactivate_patient_link(
        &self,
        doctor_id: Uuid,
        patient_id: i64,
    ) -> Result<PatientLink, RepositoryError>;

    /// Active links of a doctor, ordered by patient id
    async fn list_active_links(&self, doctor_id: Uuid)
        -> Result<Vec<PatientLink>, RepositoryError>;
}

#[async_trait]
pub trait QuestionnaireRepository: Send + Sync {
    async fn create_question(
        &self,
        questionnaire_type: QuestionnaireType,
        question_text: String,
        question_order: Option<i32>,
    ) -> Result<Question, RepositoryError>;

    async fn get_question(&self, id: i64) -> Result<Option<Question>, RepositoryError>;

    async fn create_submission(
        &self,
        patient_id: i64,
        questionnaire_type: QuestionnaireType,
    ) -> Result<Submission, RepositoryError>;

    async fn get_submission(&self, id: Uuid) -> Result<Option<Submission>, RepositoryError>;

    async fn list_submissions(&self, patient_id: i64) -> Result<Vec<Submission>, RepositoryError>;

    async fn add_answer(
        &self,
        submission_id: Uuid,
        input: CreateAnswer,
    ) -> Result<Answer, RepositoryError>;

    /// Drop every answer of the submission and store `inputs` instead
    async fn replace_answers(
        &self,
        submission_id: Uuid,
        inputs: Vec<CreateAnswer>,
    ) -> Result<Vec<Answer>, RepositoryError>;

    /// Answers in insertion order
    async fn list_answers(&self, submission_id: Uuid) -> Result<Vec<Answer>, RepositoryError>;

    async fn set_total_met_minutes(
        &self,
        submission_id: Uuid,
        total: f64,
    ) -> Result<Submission, RepositoryError>;
}

#[async_trait]
pub trait ProfileChangeRepository: Send + Sync {
    async fn create_request(
        &self,
        user_id: Uuid,
        requested_fields: serde_json::Value,
    ) -> Result<ProfileChangeRequest, RepositoryError>;

    async fn get_request(&self, id: Uuid) -> Result<Option<ProfileChangeRequest>, RepositoryError>;

    /// All requests, newest first
    async fn list_requests(&self) -> Result<Vec<ProfileChangeRequest>, RepositoryError>;

    async fn update_request_status(
        &self,
        id: Uuid,
        status: ChangeRequestStatus,
        reviewed_by: Uuid,
    ) -> Result<ProfileChangeRequest, RepositoryError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create_notification(
        &self,
        user_id: Uuid,
        message: String,
    ) -> Result<Notification, RepositoryError>;

    /// Notifications of a user, newest first
    async fn list_notifications(&self, user_id: Uuid)
        -> Result<Vec<Notification>, RepositoryError>;
}
