//! Input validation functions
//!
//! Custom validators used by the `validator` derive macros in `types` and by
//! the backend services before anything reaches the calculators.

use crate::errors::ValidationError;

/// Validate height value (in cm)
/// Valid range: 50-300 cm
pub fn validate_height_cm(height_cm: f64) -> Result<(), String> {
    if height_cm.is_nan() || height_cm.is_infinite() {
        return Err("Height must be a valid number".to_string());
    }
    if height_cm < 50.0 {
        return Err("Height must be at least 50 cm".to_string());
    }
    if height_cm > 300.0 {
        return Err("Height must be at most 300 cm".to_string());
    }
    Ok(())
}

/// Validate weight value (in kg)
pub fn validate_weight(weight_kg: f64) -> Result<(), String> {
    if weight_kg.is_nan() || weight_kg.is_infinite() {
        return Err("Weight must be a valid number".to_string());
    }
    if weight_kg < 20.0 {
        return Err("Weight must be at least 20 kg".to_string());
    }
    if weight_kg > 500.0 {
        return Err("Weight must be at most 500 kg".to_string());
    }
    Ok(())
}

/// Validate a waist or hip circumference (in cm)
pub fn validate_circumference(cm: f64) -> Result<(), String> {
    if cm.is_nan() || cm.is_infinite() {
        return Err("Circumference must be a valid number".to_string());
    }
    if cm <= 0.0 {
        return Err("Circumference must be positive".to_string());
    }
    if cm > 300.0 {
        return Err("Circumference must be at most 300 cm".to_string());
    }
    Ok(())
}

/// Validate a body-composition mass (fat, lean, water) against body weight
pub fn validate_component_mass(mass_kg: f64, weight_kg: f64) -> Result<(), String> {
    if mass_kg.is_nan() || mass_kg.is_infinite() {
        return Err("Mass must be a valid number".to_string());
    }
    if mass_kg < 0.0 {
        return Err("Mass cannot be negative".to_string());
    }
    if mass_kg > weight_kg {
        return Err("Mass cannot exceed body weight".to_string());
    }
    Ok(())
}

/// Validate date of birth
/// Must not be in the future, and age must not exceed 150 years
pub fn validate_date_of_birth(dob: chrono::NaiveDate) -> Result<(), String> {
    let today = chrono::Utc::now().date_naive();

    if dob > today {
        return Err("Date of birth cannot be in the future".to_string());
    }

    match today.years_since(dob) {
        Some(age) if age > 150 => Err("Age cannot exceed 150 years".to_string()),
        Some(_) => Ok(()),
        None => Err("Invalid date of birth".to_string()),
    }
}

// ============================================================================
// Questionnaire Validation
// ============================================================================

/// Validate days-per-week answer (0-7)
pub fn validate_days_per_week(days: i32) -> Result<(), String> {
    if !(0..=7).contains(&days) {
        return Err("Days per week must be between 0 and 7".to_string());
    }
    Ok(())
}

/// Validate a MET-minutes answer
pub fn validate_met_minutes(met_minutes: f64) -> Result<(), String> {
    if met_minutes.is_nan() || met_minutes.is_infinite() {
        return Err("MET-minutes must be a valid number".to_string());
    }
    if met_minutes < 0.0 {
        return Err("MET-minutes cannot be negative".to_string());
    }
    // Numeric(10,2) column in the submission store
    if met_minutes >= 100_000_000.0 {
        return Err("MET-minutes value unreasonably high".to_string());
    }
    Ok(())
}

// ============================================================================
// Derive Rules
// ============================================================================

// Adapters for `#[validate(custom(...))]` on the request types

fn derive_rule(
    code: &'static str,
    result: Result<(), String>,
) -> Result<(), validator::ValidationError> {
    result.map_err(|message| {
        let mut err = validator::ValidationError::new(code);
        err.message = Some(message.into());
        err
    })
}

pub fn days_per_week_rule(days: i32) -> Result<(), validator::ValidationError> {
    derive_rule("days_per_week", validate_days_per_week(days))
}

pub fn met_minutes_rule(met_minutes: f64) -> Result<(), validator::ValidationError> {
    derive_rule("met_minutes", validate_met_minutes(met_minutes))
}

pub fn circumference_rule(cm: f64) -> Result<(), validator::ValidationError> {
    derive_rule("circumference", validate_circumference(cm))
}

// ============================================================================
// Profile Change Validation
// ============================================================================

/// Fields a patient may ask to change on their profile
pub const CHANGEABLE_PROFILE_FIELDS: &[&str] =
    &["full_name", "birth_date", "sex", "place_of_residence"];

/// Validate the field set of a profile change request
pub fn validate_requested_fields(fields: &serde_json::Value) -> Result<(), ValidationError> {
    let object = fields
        .as_object()
        .ok_or_else(|| ValidationError::new("requested_fields", "must be a JSON object"))?;

    if object.is_empty() {
        return Err(ValidationError::new(
            "requested_fields",
            "at least one field must be requested",
        ));
    }

    for (name, value) in object {
        if !CHANGEABLE_PROFILE_FIELDS.contains(&name.as_str()) {
            return Err(ValidationError::new(name, "cannot be changed on request"));
        }
        if value.is_null() {
            return Err(ValidationError::new(name, "cannot be empty"));
        }
    }
    Ok(())
}

// ============================================================================
// User-Friendly Field Labels
// ============================================================================

/// Map technical field names to user-friendly display labels
pub fn get_field_display_label(field_name: &str) -> &str {
    match field_name {
        "weight" | "weight_kg" => "Weight",
        "height" | "height_cm" => "Height",
        "waist_cm" => "Waist Circumference",
        "hip_cm" => "Hip Circumference",
        "fat_mass_kg" => "Fat Mass",
        "lean_mass_kg" => "Lean Mass",
        "total_body_water_kg" => "Total Body Water",
        "extracellular_water_kg" => "Extracellular Water",
        "birth_date" => "Date of Birth",
        "sex" => "Sex",
        "full_name" => "Full Name",
        "place_of_residence" => "Place of Residence",
        "days_per_week" => "Days per Week",
        "met_minutes" => "MET-minutes",
        "requested_fields" => "Requested Changes",
        _ => field_name,
    }
}

/// Convert `validator` derive errors into a single field-level error
pub fn first_validation_error(errors: &validator::ValidationErrors) -> ValidationError {
    errors
        .field_errors()
        .into_iter()
        .next()
        .map(|(field, errs)| {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .unwrap_or_else(|| "is invalid".to_string());
            ValidationError::new(&field.to_string(), &message)
        })
        .unwrap_or_else(|| ValidationError::new("input", "is invalid"))
}
