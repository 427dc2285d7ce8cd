//! Clinical nutrition formulas
//!
//! Recommended body weight, weight-loss risk, body surface area, body mass
//! index, waist and waist-hip classification, basal metabolic rate and
//! bioimpedance-derived ratios.
//!
//! # Design Principles
//!
//! 1. **Pure Functions**: no I/O, no hidden state
//! 2. **Explicit Units**: every argument name carries its unit; the only
//!    conversions are the documented cm ↔ m ones
//! 3. **Typed Labels**: classifications are enums with a display label

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Patient Sex
// ============================================================================

/// Biological sex used by the sex-specific formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            _ => Err(format!("Unknown sex: {}", s)),
        }
    }
}

/// Centimeters to meters
#[inline]
pub fn cm_to_m(cm: f64) -> f64 {
    cm / 100.0
}

// ============================================================================
// Recommended Body Weight
// ============================================================================

/// Recommended weight by the Lorentz formula
///
/// Men: 48 + (height(cm) - 152) × 1.1
/// Women: 45 + (height(cm) - 152) × 0.9
pub fn lorentz_rec_weight(height_cm: f64, sex: Sex) -> f64 {
    let (base, slope) = match sex {
        Sex::Male => (48.0, 1.1),
        Sex::Female => (45.0, 0.9),
    };
    base + (height_cm - 152.0) * slope
}

/// Recommended weight by Broca's index with the Brugsch correction
pub fn broca_brugsch_rec_weight(height_cm: f64) -> f64 {
    if height_cm < 165.0 {
        height_cm - 100.0
    } else if height_cm <= 175.0 {
        height_cm - 105.0
    } else {
        height_cm - 110.0
    }
}

// ============================================================================
// Weight Loss and Nutritional Risk
// ============================================================================

/// Weight lost since `initial_kg`, as a percentage of it
pub fn weight_loss_pct(initial_kg: f64, current_kg: f64) -> f64 {
    (initial_kg - current_kg) / initial_kg * 100.0
}

/// Loss threshold (%) for an elapsed period in months
///
/// 1 month: 5%, 3 months: 7.5%, 6 months and anything else: 10%
pub fn nutritional_risk_threshold(months: u32) -> f64 {
    match months {
        1 => 5.0,
        3 => 7.5,
        _ => 10.0,
    }
}

/// True when the loss over `months` exceeds the threshold for that period
pub fn high_nutritional_risk(loss_pct: f64, months: u32) -> bool {
    loss_pct > nutritional_risk_threshold(months)
}

// ============================================================================
// Body Surface Area
// ============================================================================

/// BSA by Mosteller: sqrt(weight(kg) × height(cm) / 3600)
pub fn bsa_mosteller(weight_kg: f64, height_cm: f64) -> f64 {
    (weight_kg * height_cm / 3600.0).sqrt()
}

/// BSA by Shuter-Aslani: 0.00949 × weight^0.441 × height^0.655
pub fn bsa_shuter(weight_kg: f64, height_cm: f64) -> f64 {
    0.00949 * weight_kg.powf(0.441) * height_cm.powf(0.655)
}

/// BSA formula selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BsaMethod {
    #[default]
    Mosteller,
    ShuterAslani,
}

impl BsaMethod {
    /// Label stored next to the computed value
    pub fn label(&self) -> &'static str {
        match self {
            BsaMethod::Mosteller => "Mosteller",
            BsaMethod::ShuterAslani => "Shuter-Aslani",
        }
    }

    pub fn calculate(&self, weight_kg: f64, height_cm: f64) -> f64 {
        match self {
            BsaMethod::Mosteller => bsa_mosteller(weight_kg, height_cm),
            BsaMethod::ShuterAslani => bsa_shuter(weight_kg, height_cm),
        }
    }
}

// ============================================================================
// Body Mass Index
// ============================================================================

/// BMI from weight in kg and height in centimeters
///
/// Formula: 100 × weight(kg) / height(cm)²
pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    100.0 * weight_kg / (height_cm * height_cm)
}

/// BMI corrected for an amputated body segment
///
/// base = weight(kg) / height(m)², result = base + coefficient × base
pub fn bmi_with_amputation(weight_kg: f64, height_m: f64, coefficient: f64) -> f64 {
    let base = weight_kg / (height_m * height_m);
    base + coefficient * base
}

/// Amputated segment, with its share of body mass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmputationSite {
    WholeArm,
    UpperArm,
    Hand,
    ForearmHand,
    WholeLeg,
    Foot,
}

impl AmputationSite {
    pub fn coefficient(&self) -> f64 {
        match self {
            AmputationSite::WholeArm => 0.065,
            AmputationSite::UpperArm => 0.035,
            AmputationSite::Hand => 0.008,
            AmputationSite::ForearmHand => 0.031,
            AmputationSite::WholeLeg => 0.186,
            AmputationSite::Foot => 0.018,
        }
    }
}

/// BMI category classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    SevereDeficit,
    Underweight,
    Normal,
    PreObesity,
    ObesityClass1,
    ObesityClass2,
    ObesityClass3,
}

impl BmiCategory {
    /// BMI range for this category, lower bound inclusive
    pub fn range(&self) -> (f64, f64) {
        match self {
            BmiCategory::SevereDeficit => (0.0, 16.0),
            BmiCategory::Underweight => (16.0, 18.5),
            BmiCategory::Normal => (18.5, 25.0),
            BmiCategory::PreObesity => (25.0, 30.0),
            BmiCategory::ObesityClass1 => (30.0, 35.0),
            BmiCategory::ObesityClass2 => (35.0, 40.0),
            BmiCategory::ObesityClass3 => (40.0, f64::INFINITY),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BmiCategory::SevereDeficit => "Severe deficit",
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal",
            BmiCategory::PreObesity => "Pre-obesity",
            BmiCategory::ObesityClass1 => "Obesity I",
            BmiCategory::ObesityClass2 => "Obesity II",
            BmiCategory::ObesityClass3 => "Obesity III",
        }
    }
}

/// Classify a BMI value; every threshold is an exclusive upper bound
pub fn bmi_category(value: f64) -> BmiCategory {
    if value < 16.0 {
        BmiCategory::SevereDeficit
    } else if value < 18.5 {
        BmiCategory::Underweight
    } else if value < 25.0 {
        BmiCategory::Normal
    } else if value < 30.0 {
        BmiCategory::PreObesity
    } else if value < 35.0 {
        BmiCategory::ObesityClass1
    } else if value < 40.0 {
        BmiCategory::ObesityClass2
    } else {
        BmiCategory::ObesityClass3
    }
}

// ============================================================================
// Waist Circumference and Waist-Hip Ratio
// ============================================================================

/// Waist circumference status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaistStatus {
    Normal,
    /// Prevent further weight gain
    Caution,
    /// Weight correction needed
    CorrectionNeeded,
}

impl WaistStatus {
    pub fn description(&self) -> &'static str {
        match self {
            WaistStatus::Normal => "Normal",
            WaistStatus::Caution => "Weight gain prevention",
            WaistStatus::CorrectionNeeded => "Weight correction needed",
        }
    }
}

/// Classify waist circumference
///
/// Men: ≤94 normal, ≤102 caution. Women: ≤80 normal, ≤88 caution.
pub fn waist_status(waist_cm: f64, sex: Sex) -> WaistStatus {
    let (normal_max, caution_max) = match sex {
        Sex::Male => (94.0, 102.0),
        Sex::Female => (80.0, 88.0),
    };
    if waist_cm <= normal_max {
        WaistStatus::Normal
    } else if waist_cm <= caution_max {
        WaistStatus::Caution
    } else {
        WaistStatus::CorrectionNeeded
    }
}

pub fn whr(waist_cm: f64, hip_cm: f64) -> f64 {
    waist_cm / hip_cm
}

/// Waist-hip ratio status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhrStatus {
    Optimal,
    AbdominalObesity,
}

impl WhrStatus {
    pub fn description(&self) -> &'static str {
        match self {
            WhrStatus::Optimal => "Optimal",
            WhrStatus::AbdominalObesity => "Abdominal obesity",
        }
    }
}

/// Abdominal obesity when the ratio exceeds 0.95 (men) or 0.80 (women)
pub fn whr_status(ratio: f64, sex: Sex) -> WhrStatus {
    let limit = match sex {
        Sex::Male => 0.95,
        Sex::Female => 0.80,
    };
    if ratio > limit {
        WhrStatus::AbdominalObesity
    } else {
        WhrStatus::Optimal
    }
}

// ============================================================================
// Basal Metabolic Rate
// ============================================================================

/// BMR by Mifflin-St Jeor
///
/// 10 × weight(kg) + 6.25 × height(cm) - 5 × age(y) + 5 (men) / - 161 (women)
pub fn bmr_mifflin(weight_kg: f64, height_cm: f64, age_years: u32, sex: Sex) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age_years as f64;
    match sex {
        Sex::Male => base + 5.0,
        Sex::Female => base - 161.0,
    }
}

/// BMR by the revised Harris-Benedict equation
///
/// Men: 88.362 + 13.397 × weight(kg) + 4.799 × height(cm) - 5.677 × age(y)
/// Women: 447.593 + 9.247 × weight(kg) + 3.098 × height(cm) - 4.330 × age(y)
pub fn bmr_harris(weight_kg: f64, height_cm: f64, age_years: u32, sex: Sex) -> f64 {
    let age = age_years as f64;
    match sex {
        Sex::Male => 88.362 + 13.397 * weight_kg + 4.799 * height_cm - 5.677 * age,
        Sex::Female => 447.593 + 9.247 * weight_kg + 3.098 * height_cm - 4.330 * age,
    }
}

/// BMR by Katch-McArdle: 370 + 21.6 × fat-free mass(kg)
pub fn bmr_katch(ffm_kg: f64) -> f64 {
    370.0 + 21.6 * ffm_kg
}

/// BMR formula selection for anthropometric samples
///
/// Katch-McArdle needs fat-free mass and is only available on bioimpedance
/// samples, see [`crate::metrics::bioimpedance_indices`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BmrMethod {
    #[default]
    MifflinStJeor,
    HarrisBenedict,
}

impl BmrMethod {
    pub fn label(&self) -> &'static str {
        match self {
            BmrMethod::MifflinStJeor => "Mifflin-St Jeor",
            BmrMethod::HarrisBenedict => "Harris-Benedict",
        }
    }

    pub fn calculate(&self, weight_kg: f64, height_cm: f64, age_years: u32, sex: Sex) -> f64 {
        match self {
            BmrMethod::MifflinStJeor => bmr_mifflin(weight_kg, height_cm, age_years, sex),
            BmrMethod::HarrisBenedict => bmr_harris(weight_kg, height_cm, age_years, sex),
        }
    }
}

/// Recommended-weight formula selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdealWeightMethod {
    #[default]
    Lorentz,
    BrocaBrugsch,
}

impl IdealWeightMethod {
    pub fn label(&self) -> &'static str {
        match self {
            IdealWeightMethod::Lorentz => "Lorentz",
            IdealWeightMethod::BrocaBrugsch => "Broca-Brugsch",
        }
    }

    pub fn calculate(&self, height_cm: f64, sex: Sex) -> f64 {
        match self {
            IdealWeightMethod::Lorentz => lorentz_rec_weight(height_cm, sex),
            IdealWeightMethod::BrocaBrugsch => broca_brugsch_rec_weight(height_cm),
        }
    }
}

// ============================================================================
// Bioimpedance
// ============================================================================

pub fn fat_percent(fat_kg: f64, weight_kg: f64) -> f64 {
    fat_kg / weight_kg * 100.0
}

/// Fat-mass index: fat(kg) / height(m)²
pub fn fat_mass_index(fat_kg: f64, height_m: f64) -> f64 {
    fat_kg / (height_m * height_m)
}

/// Fat-free-mass index: FFM(kg) / height(m)²
pub fn ffm_index(ffm_kg: f64, height_m: f64) -> f64 {
    ffm_kg / (height_m * height_m)
}

pub fn body_water_percent(total_water_kg: f64, weight_kg: f64) -> f64 {
    total_water_kg / weight_kg * 100.0
}

/// Extracellular share of total body water
pub fn ecw_ratio(ecw_kg: f64, total_water_kg: f64) -> f64 {
    ecw_kg / total_water_kg
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    // =========================================================================
    // Recommended Weight Tests
    // =========================================================================

    #[test]
    fn test_lorentz_rec_weight() {
        assert!(approx(lorentz_rec_weight(170.0, Sex::Male), 48.0 + 18.0 * 1.1));
        assert!(approx(lorentz_rec_weight(160.0, Sex::Female), 45.0 + 8.0 * 0.9));
        assert_eq!(lorentz_rec_weight(152.0, Sex::Male), 48.0);
        assert_eq!(lorentz_rec_weight(152.0, Sex::Female), 45.0);
    }

    #[rstest]
    #[case(160.0, 60.0)]
    #[case(164.0, 64.0)]
    #[case(165.0, 60.0)]
    #[case(170.0, 65.0)]
    #[case(175.0, 70.0)]
    #[case(176.0, 66.0)]
    #[case(180.0, 70.0)]
    fn test_broca_brugsch_rec_weight(#[case] height: f64, #[case] expected: f64) {
        assert_eq!(broca_brugsch_rec_weight(height), expected);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: Lorentz is linear in height, anchored at 152 cm
        #[test]
        fn prop_lorentz_linear(height in 120.0f64..220.0, delta in 0.5f64..30.0) {
            for (sex, slope) in [(Sex::Male, 1.1), (Sex::Female, 0.9)] {
                let step = lorentz_rec_weight(height + delta, sex) - lorentz_rec_weight(height, sex);
                prop_assert!((step - slope * delta).abs() < 1e-9,
                    "slope for {} was {} (expected {})", sex, step / delta, slope);
            }
        }
    }

    // =========================================================================
    // Weight Loss Tests
    // =========================================================================

    #[test]
    fn test_weight_loss_and_risk() {
        let pct = weight_loss_pct(80.0, 76.0);
        assert!(approx(pct, 5.0));
        assert!(!high_nutritional_risk(pct, 1));
        assert!(high_nutritional_risk(5.1, 1));
        assert!(high_nutritional_risk(8.0, 3));
        assert!(!high_nutritional_risk(7.5, 3));
        assert!(!high_nutritional_risk(10.0, 6));
    }

    #[rstest]
    #[case(1, 5.0)]
    #[case(3, 7.5)]
    #[case(6, 10.0)]
    #[case(2, 10.0)]
    #[case(12, 10.0)]
    fn test_risk_thresholds(#[case] months: u32, #[case] expected: f64) {
        assert_eq!(nutritional_risk_threshold(months), expected);
    }

    #[test]
    fn test_weight_gain_is_negative_loss() {
        assert!(weight_loss_pct(70.0, 77.0) < 0.0);
        assert!(!high_nutritional_risk(weight_loss_pct(70.0, 77.0), 1));
    }

    // =========================================================================
    // BSA Tests
    // =========================================================================

    #[test]
    fn test_bsa() {
        assert!(approx(bsa_mosteller(70.0, 170.0), (70.0f64 * 170.0 / 3600.0).sqrt()));
        assert!(approx(
            bsa_shuter(70.0, 170.0),
            0.00949 * 70.0f64.powf(0.441) * 170.0f64.powf(0.655)
        ));
        assert_eq!(BsaMethod::default(), BsaMethod::Mosteller);
        assert_eq!(BsaMethod::ShuterAslani.label(), "Shuter-Aslani");
    }

    // =========================================================================
    // BMI Tests
    // =========================================================================

    #[test]
    fn test_bmi_formula() {
        assert!(approx(bmi(65.0, 170.0), 100.0 * 65.0 / (170.0 * 170.0)));
    }

    #[test]
    fn test_bmi_with_amputation() {
        let base = 65.0 / (1.7 * 1.7);
        let coefficient = AmputationSite::WholeArm.coefficient();
        assert!(approx(bmi_with_amputation(65.0, 1.7, coefficient), base + 0.065 * base));
        assert!(approx(bmi_with_amputation(65.0, 1.7, 0.0), base));
    }

    #[test]
    fn test_amputation_coefficients() {
        assert_eq!(AmputationSite::WholeArm.coefficient(), 0.065);
        assert_eq!(AmputationSite::UpperArm.coefficient(), 0.035);
        assert_eq!(AmputationSite::Hand.coefficient(), 0.008);
        assert_eq!(AmputationSite::ForearmHand.coefficient(), 0.031);
        assert_eq!(AmputationSite::WholeLeg.coefficient(), 0.186);
        assert_eq!(AmputationSite::Foot.coefficient(), 0.018);
    }

    #[rstest]
    #[case(15.0, BmiCategory::SevereDeficit)]
    #[case(15.99, BmiCategory::SevereDeficit)]
    #[case(16.0, BmiCategory::Underweight)]
    #[case(18.49, BmiCategory::Underweight)]
    #[case(18.5, BmiCategory::Normal)]
    #[case(22.0, BmiCategory::Normal)]
    #[case(25.0, BmiCategory::PreObesity)]
    #[case(29.99, BmiCategory::PreObesity)]
    #[case(30.0, BmiCategory::ObesityClass1)]
    #[case(35.0, BmiCategory::ObesityClass2)]
    #[case(39.99, BmiCategory::ObesityClass2)]
    #[case(40.0, BmiCategory::ObesityClass3)]
    fn test_bmi_category_boundaries(#[case] value: f64, #[case] expected: BmiCategory) {
        assert_eq!(bmi_category(value), expected);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: a value always falls inside its category's range
        #[test]
        fn prop_bmi_category_range(value in 0.0f64..80.0) {
            let (low, high) = bmi_category(value).range();
            prop_assert!(value >= low && value < high);
        }

        /// Property: heavier = higher BMI at the same height
        #[test]
        fn prop_bmi_increases_with_weight(
            weight1 in 40.0f64..90.0,
            weight2 in 90.0f64..150.0,
            height in 150.0f64..200.0
        ) {
            prop_assert!(bmi(weight2, height) > bmi(weight1, height));
        }
    }

    // =========================================================================
    // Waist / WHR Tests
    // =========================================================================

    #[rstest]
    #[case(90.0, Sex::Male, WaistStatus::Normal)]
    #[case(94.0, Sex::Male, WaistStatus::Normal)]
    #[case(94.5, Sex::Male, WaistStatus::Caution)]
    #[case(102.0, Sex::Male, WaistStatus::Caution)]
    #[case(103.0, Sex::Male, WaistStatus::CorrectionNeeded)]
    #[case(80.0, Sex::Female, WaistStatus::Normal)]
    #[case(85.0, Sex::Female, WaistStatus::Caution)]
    #[case(88.0, Sex::Female, WaistStatus::Caution)]
    #[case(88.1, Sex::Female, WaistStatus::CorrectionNeeded)]
    fn test_waist_status(#[case] waist: f64, #[case] sex: Sex, #[case] expected: WaistStatus) {
        assert_eq!(waist_status(waist, sex), expected);
    }

    #[test]
    fn test_whr() {
        let ratio = whr(90.0, 100.0);
        assert_eq!(ratio, 0.9);
        assert_eq!(whr_status(ratio, Sex::Female), WhrStatus::AbdominalObesity);
        assert_eq!(whr_status(ratio, Sex::Male), WhrStatus::Optimal);
        assert_eq!(whr_status(0.95, Sex::Male), WhrStatus::Optimal);
        assert_eq!(whr_status(0.80, Sex::Female), WhrStatus::Optimal);
    }

    // =========================================================================
    // BMR Tests
    // =========================================================================

    #[test]
    fn test_bmr() {
        assert!(approx(
            bmr_mifflin(65.0, 170.0, 30, Sex::Male),
            10.0 * 65.0 + 6.25 * 170.0 - 5.0 * 30.0 + 5.0
        ));
        assert!(approx(
            bmr_mifflin(65.0, 170.0, 30, Sex::Female),
            10.0 * 65.0 + 6.25 * 170.0 - 5.0 * 30.0 - 161.0
        ));
        assert!(approx(
            bmr_harris(65.0, 170.0, 30, Sex::Female),
            447.593 + 9.247 * 65.0 + 3.098 * 170.0 - 4.330 * 30.0
        ));
        assert!(approx(
            bmr_harris(65.0, 170.0, 30, Sex::Male),
            88.362 + 13.397 * 65.0 + 4.799 * 170.0 - 5.677 * 30.0
        ));
        assert!(approx(bmr_katch(50.0), 370.0 + 21.6 * 50.0));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: Mifflin male and female differ by exactly 166 kcal
        #[test]
        fn prop_mifflin_sex_offset(
            weight in 40.0f64..150.0,
            height in 140.0f64..210.0,
            age in 18u32..90
        ) {
            let male = bmr_mifflin(weight, height, age, Sex::Male);
            let female = bmr_mifflin(weight, height, age, Sex::Female);
            prop_assert!((male - female - 166.0).abs() < 1e-6);
        }
    }

    // =========================================================================
    // Bioimpedance Tests
    // =========================================================================

    #[test]
    fn test_bio_impedance() {
        assert!(approx(fat_percent(15.0, 75.0), 15.0 / 75.0 * 100.0));
        assert!(approx(fat_mass_index(15.0, 1.75), 15.0 / (1.75 * 1.75)));
        assert!(approx(ffm_index(55.0, 1.75), 55.0 / (1.75 * 1.75)));
        assert!(approx(body_water_percent(40.0, 70.0), 40.0 / 70.0 * 100.0));
        assert!(approx(ecw_ratio(15.0, 40.0), 15.0 / 40.0));
    }

    #[test]
    fn test_sex_parsing() {
        assert_eq!("male".parse::<Sex>().unwrap(), Sex::Male);
        assert_eq!("Female".parse::<Sex>().unwrap(), Sex::Female);
        assert!("other".parse::<Sex>().is_err());
        assert_eq!(serde_json::to_string(&Sex::Female).unwrap(), "\"female\"");
    }
}
