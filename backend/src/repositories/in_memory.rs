//! In-memory storage for every repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nutriform_shared::{
    Anthropometry, AnthropometricSample, Answer, BodyMetricsRecord, ChangeRequestStatus,
    DerivedBodyMetrics, LinkStatus, Notification, Patient, PatientCreate, PatientLink,
    ProfileChangeRequest, Question, QuestionnaireType, Submission,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::{
    AnthropometryRepository, BodyMetricsRepository, CreateAnswer, NotificationRepository,
    PatientLinkRepository, PatientRepository, ProfileChangeRepository, QuestionnaireRepository,
};
use crate::error::RepositoryError;

/// Process-local store; clones share the same tables
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    patients: Arc<Mutex<HashMap<i64, Patient>>>,
    anthropometry: Arc<Mutex<HashMap<Uuid, Anthropometry>>>,
    /// Keyed by anthropometry id
    body_metrics: Arc<Mutex<HashMap<Uuid, BodyMetricsRecord>>>,
    links: Arc<Mutex<HashMap<(Uuid, i64), PatientLink>>>,
    questions: Arc<Mutex<HashMap<i64, Question>>>,
    submissions: Arc<Mutex<HashMap<Uuid, Submission>>>,
    answers: Arc<Mutex<HashMap<Uuid, Vec<Answer>>>>,
    change_requests: Arc<Mutex<Vec<ProfileChangeRequest>>>,
    notifications: Arc<Mutex<Vec<Notification>>>,
    sequence: Arc<AtomicI64>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> i64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn build_answers(&self, submission_id: Uuid, inputs: Vec<CreateAnswer>) -> Vec<Answer> {
        inputs
            .into_iter()
            .map(|input| Answer {
                id: self.next_id(),
                submission_id,
                question_id: input.question_id,
                days_per_week: input.days_per_week,
                met_minutes: input.met_minutes,
                frequency: input.frequency,
            })
            .collect()
    }

    fn ensure_submission(&self, submission_id: Uuid) -> Result<(), RepositoryError> {
        let submissions = self.submissions.lock()?;
        if submissions.contains_key(&submission_id) {
            Ok(())
        } else {
            Err(RepositoryError::NotFound(format!("submission {}", submission_id)))
        }
    }
}

#[async_trait]
impl PatientRepository for InMemoryStore {
    async fn create_patient(&self, input: PatientCreate) -> Result<Patient, RepositoryError> {
        let patient = Patient {
            id: self.next_id(),
            full_name: input.full_name,
            birth_date: input.birth_date,
            sex: input.sex,
            place_of_residence: input.place_of_residence,
        };
        self.patients.lock()?.insert(patient.id, patient.clone());
        Ok(patient)
    }

    async fn get_patient(&self, id: i64) -> Result<Option<Patient>, RepositoryError> {
        Ok(self.patients.lock()?.get(&id).cloned())
    }

    async fn list_patients(&self) -> Result<Vec<Patient>, RepositoryError> {
        let mut patients: Vec<Patient> = self.patients.lock()?.values().cloned().collect();
        patients.sort_by_key(|p| p.id);
        Ok(patients)
    }
}

#[async_trait]
impl AnthropometryRepository for InMemoryStore {
    async fn create_anthropometry(
        &self,
        patient_id: i64,
        sample: AnthropometricSample,
    ) -> Result<Anthropometry, RepositoryError> {
        let record = Anthropometry {
            id: Uuid::new_v4(),
            patient_id,
            sample,
        };
        self.anthropometry.lock()?.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_anthropometry(&self, id: Uuid) -> Result<Option<Anthropometry>, RepositoryError> {
        Ok(self.anthropometry.lock()?.get(&id).cloned())
    }

    async fn list_anthropometry(
        &self,
        patient_id: i64,
    ) -> Result<Vec<Anthropometry>, RepositoryError> {
        let mut records: Vec<Anthropometry> = self
            .anthropometry
            .lock()?
            .values()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect();
        records.sort_by_key(|a| a.sample.measured_at);
        Ok(records)
    }
}

#[async_trait]
impl BodyMetricsRepository for InMemoryStore {
    async fn upsert_body_metrics(
        &self,
        anthropometry: &Anthropometry,
        metrics: DerivedBodyMetrics,
        calculated_at: DateTime<Utc>,
    ) -> Result<BodyMetricsRecord, RepositoryError> {
        let mut store = self.body_metrics.lock()?;
        let id = store
            .get(&anthropometry.id)
            .map(|existing| existing.id)
            .unwrap_or_else(Uuid::new_v4);

        let record = BodyMetricsRecord {
            id,
            anthropometry_id: anthropometry.id,
            patient_id: anthropometry.patient_id,
            metrics,
            calculated_at,
        };
        store.insert(anthropometry.id, record.clone());
        Ok(record)
    }

    async fn get_body_metrics(
        &self,
        anthropometry_id: Uuid,
    ) -> Result<Option<BodyMetricsRecord>, RepositoryError> {
        Ok(self.body_metrics.lock()?.get(&anthropometry_id).cloned())
    }

    async fn list_body_metrics(
        &self,
        patient_id: i64,
    ) -> Result<Vec<BodyMetricsRecord>, RepositoryError> {
        let mut records: Vec<BodyMetricsRecord> = self
            .body_metrics
            .lock()?
            .values()
            .filter(|m| m.patient_id == patient_id)
            .cloned()
            .collect();
        records.sort_by_key(|m| m.calculated_at);
        Ok(records)
    }
}

#[async_trait]
impl PatientLinkRepository for InMemoryStore {
    async fn add_patient_link(
        &self,
        doctor_id: Uuid,
        patient_id: i64,
    ) -> Result<PatientLink, RepositoryError> {
        let mut links = self.links.lock()?;
        let link = links
            .entry((doctor_id, patient_id))
            .or_insert_with(|| PatientLink {
                doctor_id,
                patient_id,
                added_at: Utc::now(),
                status: LinkStatus::Active,
            });
        link.status = LinkStatus::Active;
        Ok(link.clone())
    }

    async fn deactivate_patient_link(
        &self,
        doctor_id: Uuid,
        patient_id: i64,
    ) -> Result<PatientLink, RepositoryError> {
        let mut links = self.links.lock()?;
        let link = links.get_mut(&(doctor_id, patient_id)).ok_or_else(|| {
            RepositoryError::NotFound(format!("link {} -> patient {}", doctor_id, patient_id))
        })?;
        link.status = LinkStatus::Inactive;
        Ok(link.clone())
    }

    async fn list_active_links(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<PatientLink>, RepositoryError> {
        let mut links: Vec<PatientLink> = self
            .links
            .lock()?
            .values()
            .filter(|l| l.doctor_id == doctor_id && l.status == LinkStatus::Active)
            .cloned()
            .collect();
        links.sort_by_key(|l| l.patient_id);
        Ok(links)
    }
}

#[async_trait]
impl QuestionnaireRepository for InMemoryStore {
    async fn create_question(
        &self,
        questionnaire_type: QuestionnaireType,
        question_text: String,
        question_order: Option<i32>,
    ) -> Result<Question, RepositoryError> {
        let question = Question {
            id: self.next_id(),
            questionnaire_type,
            question_text,
            question_order,
        };
        self.questions.lock()?.insert(question.id, question.clone());
        Ok(question)
    }

    async fn get_question(&self, id: i64) -> Result<Option<Question>, RepositoryError> {
        Ok(self.questions.lock()?.get(&id).cloned())
    }

    async fn create_submission(
        &self,
        patient_id: i64,
        questionnaire_type: QuestionnaireType,
    ) -> Result<Submission, RepositoryError> {
        let submission = Submission {
            id: Uuid::new_v4(),
            patient_id,
            questionnaire_type,
            submitted_at: Utc::now(),
            total_met_minutes: None,
        };
        self.submissions
            .lock()?
            .insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn get_submission(&self, id: Uuid) -> Result<Option<Submission>, RepositoryError> {
        Ok(self.submissions.lock()?.get(&id).cloned())
    }

    async fn list_submissions(&self, patient_id: i64) -> Result<Vec<Submission>, RepositoryError> {
        let mut submissions: Vec<Submission> = self
            .submissions
            .lock()?
            .values()
            .filter(|s| s.patient_id == patient_id)
            .cloned()
            .collect();
        submissions.sort_by_key(|s| s.submitted_at);
        Ok(submissions)
    }

    async fn add_answer(
        &self,
        submission_id: Uuid,
        input: CreateAnswer,
    ) -> Result<Answer, RepositoryError> {
        self.ensure_submission(submission_id)?;
        let mut built = self.build_answers(submission_id, vec![input]);
        let answer = built
            .pop()
            .ok_or_else(|| RepositoryError::NotFound("answer".to_string()))?;
        self.answers
            .lock()?
            .entry(submission_id)
            .or_default()
            .push(answer.clone());
        Ok(answer)
    }

    async fn replace_answers(
        &self,
        submission_id: Uuid,
        inputs: Vec<CreateAnswer>,
    ) -> Result<Vec<Answer>, RepositoryError> {
        self.ensure_submission(submission_id)?;
        let answers = self.build_answers(submission_id, inputs);
        self.answers.lock()?.insert(submission_id, answers.clone());
        Ok(answers)
    }

    async fn list_answers(&self, submission_id: Uuid) -> Result<Vec<Answer>, RepositoryError> {
        Ok(self
            .answers
            .lock()?
            .get(&submission_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_total_met_minutes(
        &self,
        submission_id: Uuid,
        total: f64,
    ) -> Result<Submission, RepositoryError> {
        let mut submissions = self.submissions.lock()?;
        let submission = submissions
            .get_mut(&submission_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("submission {}", submission_id)))?;
        submission.total_met_minutes = Some(total);
        Ok(submission.clone())
    }
}

#[async_trait]
impl ProfileChangeRepository for InMemoryStore {
    async fn create_request(
        &self,
        user_id: Uuid,
        requested_fields: serde_json::Value,
    ) -> Result<ProfileChangeRequest, RepositoryError> {
        let request = ProfileChangeRequest {
            id: Uuid::new_v4(),
            user_id,
            requested_fields,
            status: ChangeRequestStatus::Pending,
            submitted_at: Utc::now(),
            reviewed_by: None,
        };
        self.change_requests.lock()?.push(request.clone());
        Ok(request)
    }

    async fn get_request(&self, id: Uuid) -> Result<Option<ProfileChangeRequest>, RepositoryError> {
        Ok(self
            .change_requests
            .lock()?
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn list_requests(&self) -> Result<Vec<ProfileChangeRequest>, RepositoryError> {
        // Later inserts win ties on submitted_at
        let mut requests: Vec<ProfileChangeRequest> =
            self.change_requests.lock()?.iter().rev().cloned().collect();
        requests.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(requests)
    }

    async fn update_request_status(
        &self,
        id: Uuid,
        status: ChangeRequestStatus,
        reviewed_by: Uuid,
    ) -> Result<ProfileChangeRequest, RepositoryError> {
        let mut requests = self.change_requests.lock()?;
        let request = requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("profile change request {}", id)))?;
        request.status = status;
        request.reviewed_by = Some(reviewed_by);
        Ok(request.clone())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn create_notification(
        &self,
        user_id: Uuid,
        message: String,
    ) -> Result<Notification, RepositoryError> {
        let notification = Notification {
            id: self.next_id(),
            user_id,
            message,
            created_at: Utc::now(),
            is_read: false,
        };
        self.notifications.lock()?.push(notification.clone());
        Ok(notification)
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Notification>, RepositoryError> {
        Ok(self
            .notifications
            .lock()?
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use nutriform_shared::Sex;

    fn sample(weight_kg: f64, day: u32) -> AnthropometricSample {
        AnthropometricSample {
            height_cm: 170.0,
            weight_kg,
            measured_at: Utc.with_ymd_and_hms(2024, 5, day, 8, 0, 0).unwrap(),
            waist_cm: None,
            hip_cm: None,
        }
    }

    async fn patient(store: &InMemoryStore) -> Patient {
        store
            .create_patient(PatientCreate {
                full_name: "Ivan Ivanov".to_string(),
                birth_date: NaiveDate::from_ymd_opt(1990, 5, 20).unwrap(),
                sex: Some(Sex::Male),
                place_of_residence: "Moscow".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_anthropometry_listed_oldest_first() {
        let store = InMemoryStore::new();
        let patient = patient(&store).await;

        store.create_anthropometry(patient.id, sample(71.0, 20)).await.unwrap();
        store.create_anthropometry(patient.id, sample(72.0, 2)).await.unwrap();
        store.create_anthropometry(patient.id + 100, sample(90.0, 1)).await.unwrap();

        let records = store.list_anthropometry(patient.id).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sample.weight_kg, 72.0);
    }

    #[tokio::test]
    async fn test_upsert_keeps_record_id() {
        let store = InMemoryStore::new();
        let patient = patient(&store).await;
        let anthropometry = store.create_anthropometry(patient.id, sample(70.0, 1)).await.unwrap();
        let metrics = nutriform_shared::calculate_body_metrics(
            &anthropometry.sample,
            patient.context().as_ref(),
            &Default::default(),
        )
        .unwrap();

        let first = store
            .upsert_body_metrics(&anthropometry, metrics.clone(), Utc::now())
            .await
            .unwrap();
        let second = store
            .upsert_body_metrics(&anthropometry, metrics, Utc::now())
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.body_metrics.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_link_reactivation_keeps_added_at() {
        let store = InMemoryStore::new();
        let doctor = Uuid::new_v4();

        let first = store.add_patient_link(doctor, 7).await.unwrap();
        let removed = store.deactivate_patient_link(doctor, 7).await.unwrap();
        assert_eq!(removed.status, LinkStatus::Inactive);
        assert!(store.list_active_links(doctor).await.unwrap().is_empty());

        let again = store.add_patient_link(doctor, 7).await.unwrap();
        assert_eq!(again.status, LinkStatus::Active);
        assert_eq!(again.added_at, first.added_at);
        assert_eq!(store.links.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deactivate_unknown_link_is_not_found() {
        let store = InMemoryStore::new();
        let result = store.deactivate_patient_link(Uuid::new_v4(), 1).await;
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_answers_require_submission() {
        let store = InMemoryStore::new();
        let result = store
            .add_answer(
                Uuid::new_v4(),
                CreateAnswer {
                    question_id: 1,
                    days_per_week: Some(3),
                    met_minutes: None,
                    frequency: None,
                },
            )
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_requests_listed_newest_first() {
        let store = InMemoryStore::new();
        let user = Uuid::new_v4();
        let first = store
            .create_request(user, serde_json::json!({"full_name": "A"}))
            .await
            .unwrap();
        let second = store
            .create_request(user, serde_json::json!({"full_name": "B"}))
            .await
            .unwrap();

        let listed = store.list_requests().await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }
}
