//! Body-metrics calculator
//!
//! Maps one anthropometric sample plus the owning patient's age and sex to
//! the derived indices stored next to it. Every result records which formula
//! produced each value so the choice stays auditable.

use crate::errors::CalculationError;
use crate::formulas::{
    bmr_katch, body_water_percent, cm_to_m, ecw_ratio, fat_mass_index, fat_percent, ffm_index,
    high_nutritional_risk, waist_status, weight_loss_pct, whr, whr_status, BmrMethod, BsaMethod,
    IdealWeightMethod, Sex, WaistStatus, WhrStatus,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One anthropometry measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnthropometricSample {
    pub height_cm: f64,
    pub weight_kg: f64,
    pub measured_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waist_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hip_cm: Option<f64>,
}

/// What the calculator needs to know about the owning patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientContext {
    pub birth_date: NaiveDate,
    pub sex: Sex,
}

impl PatientContext {
    /// Age in whole years at `at`, counted as elapsed days / 365
    pub fn age_at(&self, at: DateTime<Utc>) -> Result<u32, CalculationError> {
        let days = (at.date_naive() - self.birth_date).num_days();
        if days < 0 {
            return Err(CalculationError::InvalidMeasurement(format!(
                "measured at {} before birth date {}",
                at.date_naive(),
                self.birth_date
            )));
        }
        Ok((days / 365) as u32)
    }
}

/// Formula choices for one calculator run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CalculatorOptions {
    #[serde(default)]
    pub bsa_method: BsaMethod,
    #[serde(default)]
    pub bmr_method: BmrMethod,
    #[serde(default)]
    pub ideal_weight_method: IdealWeightMethod,
}

/// Indices derived from one sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedBodyMetrics {
    pub bmi: f64,
    pub bsa: f64,
    pub method_bsa: String,
    pub bmr: f64,
    pub method_bmr: String,
    pub ideal_weight_kg: f64,
    pub method_ideal_weight: String,
    pub age_years: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waist_status: Option<WaistStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whr_status: Option<WhrStatus>,
}

/// Compute the derived metrics for a sample
///
/// `patient` is `None` when the persistence layer could not resolve the
/// owning patient; that is a precondition failure, not something defaulted.
/// Denominators are not checked here: a zero height or hip yields non-finite
/// values, callers validate measurements before persisting them.
pub fn calculate_body_metrics(
    sample: &AnthropometricSample,
    patient: Option<&PatientContext>,
    options: &CalculatorOptions,
) -> Result<DerivedBodyMetrics, CalculationError> {
    let patient = patient.ok_or_else(|| {
        CalculationError::MissingPatientContext(
            "patient must be resolved before computing body metrics".to_string(),
        )
    })?;

    let age_years = patient.age_at(sample.measured_at)?;
    let sex = patient.sex;

    let bmi = crate::formulas::bmi(sample.weight_kg, sample.height_cm);
    let bsa = options.bsa_method.calculate(sample.weight_kg, sample.height_cm);
    let bmr = options
        .bmr_method
        .calculate(sample.weight_kg, sample.height_cm, age_years, sex);
    let ideal_weight_kg = options.ideal_weight_method.calculate(sample.height_cm, sex);

    let waist = sample.waist_cm.map(|w| waist_status(w, sex));
    let ratio = match (sample.waist_cm, sample.hip_cm) {
        (Some(waist_cm), Some(hip_cm)) => Some(whr(waist_cm, hip_cm)),
        _ => None,
    };

    Ok(DerivedBodyMetrics {
        bmi,
        bsa,
        method_bsa: options.bsa_method.label().to_string(),
        bmr,
        method_bmr: options.bmr_method.label().to_string(),
        ideal_weight_kg,
        method_ideal_weight: options.ideal_weight_method.label().to_string(),
        age_years,
        waist_status: waist,
        whr: ratio,
        whr_status: ratio.map(|r| whr_status(r, sex)),
    })
}

// ============================================================================
// Bioimpedance
// ============================================================================

/// Bioimpedance analyser output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BioimpedanceSample {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub fat_mass_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lean_mass_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_body_water_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracellular_water_kg: Option<f64>,
}

/// Ratios derived from a bioimpedance sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BioimpedanceIndices {
    pub fat_percent: f64,
    pub fat_mass_index: f64,
    pub fat_free_mass_kg: f64,
    pub ffm_index: f64,
    /// Katch-McArdle on the fat-free mass
    pub bmr_katch: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_water_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecw_ratio: Option<f64>,
}

pub fn bioimpedance_indices(sample: &BioimpedanceSample) -> BioimpedanceIndices {
    let height_m = cm_to_m(sample.height_cm);
    let fat_free_mass_kg = sample
        .lean_mass_kg
        .unwrap_or(sample.weight_kg - sample.fat_mass_kg);

    BioimpedanceIndices {
        fat_percent: fat_percent(sample.fat_mass_kg, sample.weight_kg),
        fat_mass_index: fat_mass_index(sample.fat_mass_kg, height_m),
        fat_free_mass_kg,
        ffm_index: ffm_index(fat_free_mass_kg, height_m),
        bmr_katch: bmr_katch(fat_free_mass_kg),
        body_water_percent: sample
            .total_body_water_kg
            .map(|tbw| body_water_percent(tbw, sample.weight_kg)),
        ecw_ratio: match (sample.extracellular_water_kg, sample.total_body_water_kg) {
            (Some(ecw), Some(tbw)) => Some(ecw_ratio(ecw, tbw)),
            _ => None,
        },
    }
}

// ============================================================================
// Weight Loss Assessment
// ============================================================================

/// Weight change over a period and the nutritional-risk verdict for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightLossAssessment {
    pub initial_kg: f64,
    pub current_kg: f64,
    pub loss_pct: f64,
    pub months: u32,
    pub high_risk: bool,
}

/// Compare the earliest sample inside the last `months` to the latest one
///
/// Months are counted as 30 days. Returns `None` when fewer than two samples
/// fall inside the window, or when the window reaches past the representable
/// date range.
pub fn assess_weight_loss(
    history: &[AnthropometricSample],
    months: u32,
) -> Option<WeightLossAssessment> {
    let latest = history.iter().max_by_key(|s| s.measured_at)?;
    let window = chrono::Duration::try_days(30 * i64::from(months))?;
    let window_start = latest.measured_at.checked_sub_signed(window)?;

    let earliest = history
        .iter()
        .filter(|s| s.measured_at >= window_start && s.measured_at < latest.measured_at)
        .min_by_key(|s| s.measured_at)?;

    let loss_pct = weight_loss_pct(earliest.weight_kg, latest.weight_kg);
    Some(WeightLossAssessment {
        initial_kg: earliest.weight_kg,
        current_kg: latest.weight_kg,
        loss_pct,
        months,
        high_risk: high_nutritional_risk(loss_pct, months),
    })
}
