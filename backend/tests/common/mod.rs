//! Common test utilities for integration tests
//!
//! This module provides shared setup for integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use nutriform_backend::{
    config::AppConfig, repositories::InMemoryStore, services::PatientService, state::AppState,
};
use nutriform_shared::{Patient, PatientCreate, QuestionnaireType, Sex};

pub const SITTING_QUESTION: &str = "Сколько времени в день вы обычно проводите сидя?";

/// Test application wrapper
pub struct TestApp {
    pub state: AppState,
}

impl TestApp {
    /// Create a new test application with an empty store
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            state: AppState::new(InMemoryStore::new(), config),
        }
    }

    pub fn store(&self) -> &InMemoryStore {
        self.state.store()
    }

    /// Create a patient born on `birth_date`
    pub async fn create_patient(&self, birth_date: NaiveDate, sex: Option<Sex>) -> Patient {
        PatientService::create_patient(
            self.store(),
            PatientCreate {
                full_name: "Test Patient".to_string(),
                birth_date,
                sex,
                place_of_residence: "Moscow".to_string(),
            },
        )
        .await
        .expect("Failed to create test patient")
    }

    /// Register the activity questions used by the MET tests, in display order
    pub async fn activity_questions(&self) -> ActivityQuestions {
        use nutriform_backend::services::QuestionnaireService;

        let create = |text: &'static str, order: i32| async move {
            QuestionnaireService::create_question(
                self.store(),
                QuestionnaireType::PhysicalActivity,
                text,
                Some(order),
            )
            .await
            .expect("Failed to create question")
            .id
        };

        ActivityQuestions {
            running_days: create("Сколько дней в неделю вы бегаете?", 1).await,
            running_minutes: create("Сколько минут в день вы бегаете?", 2).await,
            sitting: create(SITTING_QUESTION, 3).await,
        }
    }
}

pub struct ActivityQuestions {
    pub running_days: i64,
    pub running_minutes: i64,
    pub sitting: i64,
}

pub fn test_config() -> AppConfig {
    AppConfig::default()
}
