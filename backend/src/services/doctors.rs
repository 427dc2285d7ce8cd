//! Doctor service - patient links, searches and panel statistics

use chrono::{NaiveDate, Utc};
use nutriform_shared::{Patient, PatientLink, PatientSearch, PatientStats, StatsScope};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{RepositoryError, ServiceError, ServiceResult};
use crate::repositories::{
    BodyMetricsRepository, PatientLinkRepository, PatientRepository, QuestionnaireRepository,
};

/// Doctor service for the patients a doctor follows
pub struct DoctorService;

impl DoctorService {
    /// Link a patient to a doctor, reactivating a removed link
    pub async fn add_patient<S>(
        store: &S,
        doctor_id: Uuid,
        patient_id: i64,
    ) -> ServiceResult<PatientLink>
    where
        S: PatientRepository + PatientLinkRepository + ?Sized,
    {
        if store.get_patient(patient_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Patient {} not found",
                patient_id
            )));
        }

        let link = store.add_patient_link(doctor_id, patient_id).await?;
        info!(%doctor_id, patient_id, "Patient linked to doctor");
        Ok(link)
    }

    /// Deactivate a link; the record stays so it can be reactivated
    pub async fn remove_patient<S>(
        store: &S,
        doctor_id: Uuid,
        patient_id: i64,
    ) -> ServiceResult<PatientLink>
    where
        S: PatientLinkRepository + ?Sized,
    {
        let link = store
            .deactivate_patient_link(doctor_id, patient_id)
            .await
            .map_err(|err| match err {
                RepositoryError::NotFound(_) => ServiceError::NotFound(format!(
                    "Patient {} is not linked to doctor {}",
                    patient_id, doctor_id
                )),
                other => other.into(),
            })?;
        info!(%doctor_id, patient_id, "Patient unlinked from doctor");
        Ok(link)
    }

    /// Actively linked patients, ordered by id
    pub async fn list_patients<S>(store: &S, doctor_id: Uuid) -> ServiceResult<Vec<Patient>>
    where
        S: PatientRepository + PatientLinkRepository + ?Sized,
    {
        let links = store.list_active_links(doctor_id).await?;
        let mut patients = Vec::with_capacity(links.len());
        for link in links {
            match store.get_patient(link.patient_id).await? {
                Some(patient) => patients.push(patient),
                None => debug!(patient_id = link.patient_id, "Linked patient no longer stored"),
            }
        }
        Ok(patients)
    }

    pub async fn search_patients<S>(
        store: &S,
        doctor_id: Uuid,
        search: &PatientSearch,
    ) -> ServiceResult<Vec<Patient>>
    where
        S: PatientRepository + PatientLinkRepository + ?Sized,
    {
        let patients = Self::list_patients(store, doctor_id).await?;
        Ok(patients
            .into_iter()
            .filter(|p| search.matches(p))
            .collect())
    }

    pub async fn stats<S>(
        store: &S,
        doctor_id: Uuid,
        scope: StatsScope,
    ) -> ServiceResult<PatientStats>
    where
        S: PatientRepository
            + PatientLinkRepository
            + BodyMetricsRepository
            + QuestionnaireRepository
            + ?Sized,
    {
        Self::stats_as_of(store, doctor_id, scope, Utc::now().date_naive()).await
    }

    /// Statistics with ages taken at `today`
    ///
    /// Age is counted in full years. BMI is averaged over every computed
    /// measurement of the covered patients, not one value per patient.
    pub async fn stats_as_of<S>(
        store: &S,
        doctor_id: Uuid,
        scope: StatsScope,
        today: NaiveDate,
    ) -> ServiceResult<PatientStats>
    where
        S: PatientRepository
            + PatientLinkRepository
            + BodyMetricsRepository
            + QuestionnaireRepository
            + ?Sized,
    {
        let patients = match scope {
            StatsScope::All => store.list_patients().await?,
            StatsScope::Linked => Self::list_patients(store, doctor_id).await?,
        };

        let ages: Vec<f64> = patients
            .iter()
            .filter_map(|p| today.years_since(p.birth_date))
            .map(f64::from)
            .collect();

        let mut bmis = Vec::new();
        let mut total_surveys = 0;
        for patient in &patients {
            bmis.extend(
                store
                    .list_body_metrics(patient.id)
                    .await?
                    .into_iter()
                    .map(|record| record.metrics.bmi),
            );
            total_surveys += store.list_submissions(patient.id).await?.len();
        }

        let stats = PatientStats {
            total_patients: patients.len(),
            average_age: mean(&ages),
            average_bmi: mean(&bmis),
            total_surveys,
        };
        debug!(%doctor_id, ?scope, total = stats.total_patients, "Patient stats computed");
        Ok(stats)
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
