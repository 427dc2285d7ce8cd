//! Patient service - business logic for patient records

use nutriform_shared::validation::{first_validation_error, validate_date_of_birth};
use nutriform_shared::{Patient, PatientCreate, ValidationError};
use tracing::info;
use validator::Validate;

use crate::error::{ServiceError, ServiceResult};
use crate::repositories::PatientRepository;

/// Patient service for patient record operations
pub struct PatientService;

impl PatientService {
    pub async fn create_patient<S>(store: &S, input: PatientCreate) -> ServiceResult<Patient>
    where
        S: PatientRepository + ?Sized,
    {
        input
            .validate()
            .map_err(|errors| ServiceError::Validation(first_validation_error(&errors)))?;
        validate_date_of_birth(input.birth_date)
            .map_err(|msg| ValidationError::new("birth_date", &msg))?;

        let patient = store.create_patient(input).await?;
        info!(patient_id = patient.id, "Patient created");
        Ok(patient)
    }

    pub async fn get_patient<S>(store: &S, patient_id: i64) -> ServiceResult<Patient>
    where
        S: PatientRepository + ?Sized,
    {
        store
            .get_patient(patient_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Patient {} not found", patient_id)))
    }

    pub async fn list_patients<S>(store: &S) -> ServiceResult<Vec<Patient>>
    where
        S: PatientRepository + ?Sized,
    {
        Ok(store.list_patients().await?)
    }
}
