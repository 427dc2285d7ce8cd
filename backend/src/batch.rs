//! Batch runner
//!
//! Feeds a JSON document of questions, patients, measurements and
//! questionnaire submissions through the services and collects the derived
//! results. A failing item is reported in place and does not stop the run.

use nutriform_shared::{
    AnswerCreate, AnthropometryCreate, BioimpedanceIndices, BioimpedanceSample, ErrorResponse,
    FrequencyCategory, Patient, PatientCreate, QuestionnaireType, SubmissionCreate,
    SubmissionSummary, WeightLossAssessment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::services::{
    BodyMetricsService, PatientService, QuestionnaireService, RecordedMeasurement,
};
use crate::state::AppState;

/// Batch input document
#[derive(Debug, Clone, Deserialize)]
pub struct BatchInput {
    #[serde(default)]
    pub questions: Vec<BatchQuestion>,
    #[serde(default)]
    pub patients: Vec<BatchPatient>,
}

/// Question declared once and referenced by `key` from answers
#[derive(Debug, Clone, Deserialize)]
pub struct BatchQuestion {
    pub key: String,
    pub questionnaire_type: QuestionnaireType,
    pub text: String,
    #[serde(default)]
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchPatient {
    #[serde(flatten)]
    pub patient: PatientCreate,
    #[serde(default)]
    pub measurements: Vec<AnthropometryCreate>,
    #[serde(default)]
    pub bioimpedance: Vec<BioimpedanceSample>,
    #[serde(default)]
    pub submissions: Vec<BatchSubmission>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchSubmission {
    pub questionnaire_type: QuestionnaireType,
    #[serde(default)]
    pub answers: Vec<BatchAnswer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchAnswer {
    /// Key of a declared question
    pub question: String,
    #[serde(default)]
    pub days_per_week: Option<i32>,
    #[serde(default)]
    pub met_minutes: Option<f64>,
    #[serde(default)]
    pub frequency: Option<FrequencyCategory>,
}

/// Per-item outcome
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ItemResult<T> {
    Ok(T),
    Err(ErrorResponse),
}

impl<T> From<ServiceResult<T>> for ItemResult<T> {
    fn from(result: ServiceResult<T>) -> Self {
        match result {
            Ok(value) => ItemResult::Ok(value),
            Err(err) => ItemResult::Err(err.to_response()),
        }
    }
}

impl<T> ItemResult<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, ItemResult::Ok(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientReport {
    pub patient: ItemResult<Patient>,
    pub measurements: Vec<ItemResult<RecordedMeasurement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_loss: Option<WeightLossAssessment>,
    pub bioimpedance: Vec<ItemResult<BioimpedanceIndices>>,
    pub submissions: Vec<ItemResult<SubmissionSummary>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub patients: Vec<PatientReport>,
}

/// Run a whole batch against the state's store
pub async fn run_batch(state: &AppState, input: BatchInput) -> ServiceResult<BatchReport> {
    let store = state.store();

    let mut question_ids = HashMap::new();
    for question in input.questions {
        let created = QuestionnaireService::create_question(
            store,
            question.questionnaire_type,
            &question.text,
            question.order,
        )
        .await?;
        question_ids.insert(question.key, created.id);
    }

    let mut reports = Vec::with_capacity(input.patients.len());
    for entry in input.patients {
        reports.push(run_patient(state, &question_ids, entry).await?);
    }

    info!(patients = reports.len(), "Batch complete");
    Ok(BatchReport { patients: reports })
}

async fn run_patient(
    state: &AppState,
    question_ids: &HashMap<String, i64>,
    entry: BatchPatient,
) -> ServiceResult<PatientReport> {
    let store = state.store();

    let patient = match PatientService::create_patient(store, entry.patient).await {
        Ok(patient) => patient,
        Err(err) => {
            warn!(error = %err, "Patient rejected");
            return Ok(PatientReport {
                patient: ItemResult::Err(err.to_response()),
                measurements: Vec::new(),
                weight_loss: None,
                bioimpedance: Vec::new(),
                submissions: Vec::new(),
            });
        }
    };

    let mut measurements = Vec::with_capacity(entry.measurements.len());
    for measurement in entry.measurements {
        let result = BodyMetricsService::record_anthropometry(
            store,
            state.options(),
            patient.id,
            measurement,
        )
        .await;
        measurements.push(ItemResult::from(result));
    }

    let weight_loss = BodyMetricsService::weight_loss_risk(
        store,
        patient.id,
        state.config().calculator.weight_loss_window_months,
    )
    .await?;

    let bioimpedance = entry
        .bioimpedance
        .iter()
        .map(|sample| ItemResult::from(BodyMetricsService::bioimpedance(sample)))
        .collect();

    let mut submissions = Vec::with_capacity(entry.submissions.len());
    for submission in entry.submissions {
        let result = match resolve_answers(question_ids, submission.answers) {
            Ok(answers) => {
                QuestionnaireService::create_submission(
                    store,
                    state.matcher(),
                    patient.id,
                    SubmissionCreate {
                        questionnaire_type: submission.questionnaire_type,
                        answers,
                    },
                )
                .await
            }
            Err(err) => Err(err),
        };
        submissions.push(ItemResult::from(result));
    }

    Ok(PatientReport {
        patient: ItemResult::Ok(patient),
        measurements,
        weight_loss,
        bioimpedance,
        submissions,
    })
}

fn resolve_answers(
    question_ids: &HashMap<String, i64>,
    answers: Vec<BatchAnswer>,
) -> ServiceResult<Vec<AnswerCreate>> {
    answers
        .into_iter()
        .map(|answer| {
            let question_id = question_ids.get(&answer.question).copied().ok_or_else(|| {
                ServiceError::NotFound(format!("Question '{}' is not declared", answer.question))
            })?;
            Ok(AnswerCreate {
                question_id,
                days_per_week: answer.days_per_week,
                met_minutes: answer.met_minutes,
                frequency: answer.frequency,
            })
        })
        .collect()
}
