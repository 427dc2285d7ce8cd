//! Nutriform WASM Module
//!
//! WebAssembly bindings for the body-metrics formulas and the MET-minutes
//! aggregation so a browser form can preview results before submitting.
//!
//! Methods and sex are passed as the same lowercase strings the backend
//! accepts (`"mosteller"`, `"mifflin_st_jeor"`, `"female"`, ...).

use nutriform_shared::{
    aggregate_met_minutes, bmi, whr, whr_status, BmrMethod, BsaMethod, IdealWeightMethod,
    QuestionnaireAnswer, SedentaryMatcher, Sex,
};
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

fn parse_method<T: DeserializeOwned>(name: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(name.to_string()))
        .map_err(|_| format!("Unknown method: {}", name))
}

fn to_js<T>(result: Result<T, String>) -> Result<T, JsError> {
    result.map_err(|msg| JsError::new(&msg))
}

/// BMI from weight (kg) and height (cm), as 100 × weight / height²
#[wasm_bindgen]
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    if height_cm <= 0.0 {
        return 0.0;
    }
    bmi(weight_kg, height_cm)
}

fn bsa(method: &str, weight_kg: f64, height_cm: f64) -> Result<f64, String> {
    let method: BsaMethod = parse_method(method)?;
    Ok(method.calculate(weight_kg, height_cm))
}

/// Body surface area (m²)
#[wasm_bindgen]
pub fn calculate_bsa(method: &str, weight_kg: f64, height_cm: f64) -> Result<f64, JsError> {
    to_js(bsa(method, weight_kg, height_cm))
}

fn bmr(
    method: &str,
    weight_kg: f64,
    height_cm: f64,
    age_years: u32,
    sex: &str,
) -> Result<f64, String> {
    let method: BmrMethod = parse_method(method)?;
    let sex: Sex = sex.parse()?;
    Ok(method.calculate(weight_kg, height_cm, age_years, sex))
}

/// Basal metabolic rate (kcal/day)
#[wasm_bindgen]
pub fn calculate_bmr(
    method: &str,
    weight_kg: f64,
    height_cm: f64,
    age_years: u32,
    sex: &str,
) -> Result<f64, JsError> {
    to_js(bmr(method, weight_kg, height_cm, age_years, sex))
}

fn ideal_weight(method: &str, height_cm: f64, sex: &str) -> Result<f64, String> {
    let method: IdealWeightMethod = parse_method(method)?;
    let sex: Sex = sex.parse()?;
    Ok(method.calculate(height_cm, sex))
}

/// Recommended body weight (kg)
#[wasm_bindgen]
pub fn calculate_ideal_weight(method: &str, height_cm: f64, sex: &str) -> Result<f64, JsError> {
    to_js(ideal_weight(method, height_cm, sex))
}

/// Waist-to-hip ratio; 0 when the hip circumference is not positive
#[wasm_bindgen]
pub fn calculate_whr(waist_cm: f64, hip_cm: f64) -> f64 {
    if hip_cm <= 0.0 {
        return 0.0;
    }
    whr(waist_cm, hip_cm)
}

fn whr_label(ratio: f64, sex: &str) -> Result<String, String> {
    let sex: Sex = sex.parse()?;
    Ok(whr_status(ratio, sex).description().to_string())
}

/// Interpretation of a waist-to-hip ratio
#[wasm_bindgen]
pub fn classify_whr(ratio: f64, sex: &str) -> Result<String, JsError> {
    to_js(whr_label(ratio, sex))
}

fn met_minutes(answers_json: &str) -> Result<f64, String> {
    let answers: Vec<QuestionnaireAnswer> =
        serde_json::from_str(answers_json).map_err(|e| format!("Invalid answers: {}", e))?;
    Ok(aggregate_met_minutes(&answers, &SedentaryMatcher::default()).total_met_minutes)
}

/// Weekly MET-minutes for a JSON array of answers joined with their questions
#[wasm_bindgen]
pub fn calculate_met_minutes(answers_json: &str) -> Result<f64, JsError> {
    to_js(met_minutes(answers_json))
}
