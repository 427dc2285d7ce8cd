//! Anthropometry and derived body metrics service
//!
//! Provides business logic for:
//! - Recording a measurement together with its derived metrics
//! - Recomputing the metrics of an existing measurement
//! - Weight-loss nutritional risk over a patient's history

use chrono::Utc;
use nutriform_shared::validation::first_validation_error;
use nutriform_shared::{
    assess_weight_loss, bioimpedance_indices, calculate_body_metrics, Anthropometry,
    AnthropometricSample, AnthropometryCreate, BioimpedanceIndices, BioimpedanceSample,
    BodyMetricsRecord, CalculatorOptions, DerivedBodyMetrics, Patient, ValidationError,
    WeightLossAssessment,
};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ServiceError, ServiceResult};
use crate::repositories::{AnthropometryRepository, BodyMetricsRepository, PatientRepository};

/// A stored measurement with its metrics
#[derive(Debug, Clone, Serialize)]
pub struct RecordedMeasurement {
    pub anthropometry: Anthropometry,
    pub metrics: BodyMetricsRecord,
}

/// Body metrics service for business logic
pub struct BodyMetricsService;

impl BodyMetricsService {
    /// Validate a measurement, compute its metrics, then store both
    ///
    /// The metrics are computed before anything is written, so a patient
    /// without a recorded sex or a sample dated before birth leaves the
    /// store untouched.
    pub async fn record_anthropometry<S>(
        store: &S,
        options: &CalculatorOptions,
        patient_id: i64,
        input: AnthropometryCreate,
    ) -> ServiceResult<RecordedMeasurement>
    where
        S: PatientRepository + AnthropometryRepository + BodyMetricsRepository + ?Sized,
    {
        input
            .validate()
            .map_err(|errors| ServiceError::Validation(first_validation_error(&errors)))?;

        let patient = store
            .get_patient(patient_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Patient {} not found", patient_id)))?;

        let sample = input.into_sample();
        let derived = Self::calculate(&sample, &patient, options)?;

        let anthropometry = store.create_anthropometry(patient_id, sample).await?;
        debug!(anthropometry_id = %anthropometry.id, patient_id, "Anthropometry stored");

        let metrics = Self::store_metrics(store, &anthropometry, derived).await?;
        Ok(RecordedMeasurement {
            anthropometry,
            metrics,
        })
    }

    /// Recompute and overwrite the metrics of an existing measurement
    pub async fn recompute<S>(
        store: &S,
        options: &CalculatorOptions,
        anthropometry_id: Uuid,
    ) -> ServiceResult<BodyMetricsRecord>
    where
        S: PatientRepository + AnthropometryRepository + BodyMetricsRepository + ?Sized,
    {
        let anthropometry = store
            .get_anthropometry(anthropometry_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Anthropometry {} not found", anthropometry_id))
            })?;
        let patient = store
            .get_patient(anthropometry.patient_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Patient {} not found", anthropometry.patient_id))
            })?;

        let derived = Self::calculate(&anthropometry.sample, &patient, options)?;
        Self::store_metrics(store, &anthropometry, derived).await
    }

    fn calculate(
        sample: &AnthropometricSample,
        patient: &Patient,
        options: &CalculatorOptions,
    ) -> ServiceResult<DerivedBodyMetrics> {
        let context = patient.context();
        calculate_body_metrics(sample, context.as_ref(), options).map_err(|err| {
            warn!(
                patient_id = patient.id,
                measured_at = %sample.measured_at,
                error = %err,
                "Body metrics calculation failed"
            );
            metrics::counter!("nutriform_body_metrics_failures_total").increment(1);
            err.into()
        })
    }

    async fn store_metrics<S>(
        store: &S,
        anthropometry: &Anthropometry,
        derived: DerivedBodyMetrics,
    ) -> ServiceResult<BodyMetricsRecord>
    where
        S: BodyMetricsRepository + ?Sized,
    {
        let record = store
            .upsert_body_metrics(anthropometry, derived, Utc::now())
            .await?;

        metrics::counter!("nutriform_body_metrics_computed_total").increment(1);
        info!(
            anthropometry_id = %anthropometry.id,
            bmi = record.metrics.bmi,
            method_bsa = %record.metrics.method_bsa,
            method_bmr = %record.metrics.method_bmr,
            "Body metrics computed"
        );
        Ok(record)
    }

    /// Metrics of the patient's most recent measurement
    pub async fn latest<S>(store: &S, patient_id: i64) -> ServiceResult<Option<RecordedMeasurement>>
    where
        S: AnthropometryRepository + BodyMetricsRepository + ?Sized,
    {
        let Some(anthropometry) = store.list_anthropometry(patient_id).await?.pop() else {
            return Ok(None);
        };

        Ok(store
            .get_body_metrics(anthropometry.id)
            .await?
            .map(|metrics| RecordedMeasurement {
                anthropometry,
                metrics,
            }))
    }

    /// Weight-loss nutritional risk over the last `months`
    pub async fn weight_loss_risk<S>(
        store: &S,
        patient_id: i64,
        months: u32,
    ) -> ServiceResult<Option<WeightLossAssessment>>
    where
        S: AnthropometryRepository + ?Sized,
    {
        let history: Vec<AnthropometricSample> = store
            .list_anthropometry(patient_id)
            .await?
            .into_iter()
            .map(|a| a.sample)
            .collect();

        let assessment = assess_weight_loss(&history, months);
        if let Some(a) = assessment.as_ref().filter(|a| a.high_risk) {
            warn!(
                patient_id,
                loss_pct = a.loss_pct,
                months,
                "High nutritional risk from weight loss"
            );
        }
        Ok(assessment)
    }

    /// Validate a bioimpedance reading and derive its indices
    pub fn bioimpedance(sample: &BioimpedanceSample) -> ServiceResult<BioimpedanceIndices> {
        use nutriform_shared::validation::{
            validate_component_mass, validate_height_cm, validate_weight,
        };

        let field_error = |field: &str, message: String| {
            ServiceError::Validation(ValidationError::new(field, &message))
        };

        validate_weight(sample.weight_kg).map_err(|m| field_error("weight_kg", m))?;
        validate_height_cm(sample.height_cm).map_err(|m| field_error("height_cm", m))?;
        validate_component_mass(sample.fat_mass_kg, sample.weight_kg)
            .map_err(|m| field_error("fat_mass_kg", m))?;

        let optional = [
            ("lean_mass_kg", sample.lean_mass_kg),
            ("total_body_water_kg", sample.total_body_water_kg),
            ("extracellular_water_kg", sample.extracellular_water_kg),
        ];
        for (field, value) in optional {
            if let Some(mass) = value {
                validate_component_mass(mass, sample.weight_kg)
                    .map_err(|m| field_error(field, m))?;
            }
        }

        if let (Some(ecw), Some(tbw)) = (sample.extracellular_water_kg, sample.total_body_water_kg) {
            if tbw <= 0.0 || ecw > tbw {
                return Err(field_error(
                    "extracellular_water_kg",
                    "must not exceed total body water".to_string(),
                ));
            }
        }

        Ok(bioimpedance_indices(sample))
    }
}
