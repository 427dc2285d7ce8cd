//! Questionnaire submissions and MET-minutes scoring
//!
//! Every write to a submission's answer set recomputes its weekly
//! MET-minutes and overwrites the stored total.

use nutriform_shared::validation::first_validation_error;
use nutriform_shared::{
    aggregate_met_minutes, Answer, AnswerCreate, Question, QuestionnaireAnswer,
    QuestionnaireType, SedentaryMatcher, Submission, SubmissionCreate, SubmissionSummary,
    ValidationError,
};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ServiceError, ServiceResult};
use crate::repositories::{CreateAnswer, PatientRepository, QuestionnaireRepository};

/// Questionnaire service for business logic
pub struct QuestionnaireService;

impl QuestionnaireService {
    /// Open a submission and store its initial answers
    pub async fn create_submission<S>(
        store: &S,
        matcher: &SedentaryMatcher,
        patient_id: i64,
        input: SubmissionCreate,
    ) -> ServiceResult<SubmissionSummary>
    where
        S: PatientRepository + QuestionnaireRepository + ?Sized,
    {
        if store.get_patient(patient_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("Patient {} not found", patient_id)));
        }
        let answers = Self::validate_answers(store, input.answers).await?;

        let submission = store
            .create_submission(patient_id, input.questionnaire_type)
            .await?;
        let stored = store.replace_answers(submission.id, answers).await?;
        let submission = Self::recompute_met_minutes(store, matcher, submission.id).await?;

        Ok(summary(&submission, stored.len()))
    }

    /// Append one answer, then recompute the submission total
    pub async fn add_answer<S>(
        store: &S,
        matcher: &SedentaryMatcher,
        submission_id: Uuid,
        input: AnswerCreate,
    ) -> ServiceResult<Answer>
    where
        S: QuestionnaireRepository + ?Sized,
    {
        Self::get_submission(store, submission_id).await?;
        let answer = Self::validate_answer(store, input).await?;

        let stored = store.add_answer(submission_id, answer).await?;
        Self::recompute_met_minutes(store, matcher, submission_id).await?;
        Ok(stored)
    }

    /// Replace the whole answer set, then recompute the submission total
    pub async fn replace_answers<S>(
        store: &S,
        matcher: &SedentaryMatcher,
        submission_id: Uuid,
        inputs: Vec<AnswerCreate>,
    ) -> ServiceResult<SubmissionSummary>
    where
        S: QuestionnaireRepository + ?Sized,
    {
        Self::get_submission(store, submission_id).await?;
        let answers = Self::validate_answers(store, inputs).await?;

        let stored = store.replace_answers(submission_id, answers).await?;
        let submission = Self::recompute_met_minutes(store, matcher, submission_id).await?;
        Ok(summary(&submission, stored.len()))
    }

    /// Aggregate the stored answers and overwrite the submission total
    ///
    /// Nutrition submissions are scored too; without activity answers their
    /// total is 0.
    pub async fn recompute_met_minutes<S>(
        store: &S,
        matcher: &SedentaryMatcher,
        submission_id: Uuid,
    ) -> ServiceResult<Submission>
    where
        S: QuestionnaireRepository + ?Sized,
    {
        let answers = store.list_answers(submission_id).await?;

        let mut questions = HashMap::new();
        for answer in &answers {
            if !questions.contains_key(&answer.question_id) {
                if let Some(question) = store.get_question(answer.question_id).await? {
                    questions.insert(answer.question_id, question);
                }
            }
        }

        let joined: Vec<QuestionnaireAnswer> = answers
            .iter()
            .map(|a| a.with_question(questions.get(&a.question_id)))
            .collect();

        let aggregate = aggregate_met_minutes(&joined, matcher);
        debug!(
            %submission_id,
            sedentary = aggregate.sedentary_answers,
            paired = aggregate.paired_answers,
            skipped = aggregate.skipped_answers,
            "MET-minutes aggregated"
        );

        let submission = store
            .set_total_met_minutes(submission_id, aggregate.total_met_minutes)
            .await?;
        metrics::counter!("nutriform_met_recomputations_total").increment(1);
        info!(
            %submission_id,
            total_met_minutes = aggregate.total_met_minutes,
            "Submission score updated"
        );
        Ok(submission)
    }

    /// A patient's submissions, oldest first
    pub async fn list_submissions<S>(store: &S, patient_id: i64) -> ServiceResult<Vec<Submission>>
    where
        S: QuestionnaireRepository + ?Sized,
    {
        Ok(store.list_submissions(patient_id).await?)
    }

    async fn get_submission<S>(store: &S, submission_id: Uuid) -> ServiceResult<Submission>
    where
        S: QuestionnaireRepository + ?Sized,
    {
        store
            .get_submission(submission_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Submission {} not found", submission_id)))
    }

    /// Range-check an answer and make sure its question exists
    async fn validate_answer<S>(store: &S, input: AnswerCreate) -> ServiceResult<CreateAnswer>
    where
        S: QuestionnaireRepository + ?Sized,
    {
        input
            .validate()
            .map_err(|errors| ServiceError::Validation(first_validation_error(&errors)))?;

        if store.get_question(input.question_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Question {} not found",
                input.question_id
            )));
        }

        Ok(CreateAnswer {
            question_id: input.question_id,
            days_per_week: input.days_per_week,
            met_minutes: input.met_minutes,
            frequency: input.frequency,
        })
    }

    async fn validate_answers<S>(
        store: &S,
        inputs: Vec<AnswerCreate>,
    ) -> ServiceResult<Vec<CreateAnswer>>
    where
        S: QuestionnaireRepository + ?Sized,
    {
        let mut answers = Vec::with_capacity(inputs.len());
        for input in inputs {
            answers.push(Self::validate_answer(store, input).await?);
        }
        Ok(answers)
    }

    /// Register a question
    pub async fn create_question<S>(
        store: &S,
        questionnaire_type: QuestionnaireType,
        question_text: &str,
        question_order: Option<i32>,
    ) -> ServiceResult<Question>
    where
        S: QuestionnaireRepository + ?Sized,
    {
        if question_text.trim().is_empty() {
            return Err(ValidationError::new("question_text", "cannot be empty").into());
        }
        Ok(store
            .create_question(questionnaire_type, question_text.to_string(), question_order)
            .await?)
    }
}

fn summary(submission: &Submission, answer_count: usize) -> SubmissionSummary {
    SubmissionSummary {
        submission_id: submission.id,
        patient_id: submission.patient_id,
        questionnaire_type: submission.questionnaire_type,
        answer_count,
        total_met_minutes: submission.total_met_minutes,
    }
}
