//! MET-minutes aggregation for physical-activity questionnaires
//!
//! A submission's answers are reduced to one weekly MET-minutes score. Each
//! frequency question ("how many days a week...") is expected to be
//! immediately followed, in display order, by its intensity question, and
//! sitting time is reported as a daily figure. Nothing links the two
//! questions of a pair except their position.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Sitting-time question used by the standard questionnaire
pub const DEFAULT_SEDENTARY_PHRASES: &[&str] =
    &["сколько времени в день вы обычно проводите сидя"];

const DAYS_PER_WEEK: i64 = 7;

/// Dietary frequency answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrequencyCategory {
    #[serde(rename = "never")]
    Never,
    #[serde(rename = "1-3 per month")]
    MonthlyOneToThree,
    #[serde(rename = "1 per week")]
    WeeklyOnce,
    #[serde(rename = "2-4 per week")]
    WeeklyTwoToFour,
    #[serde(rename = "1 per day")]
    DailyOnce,
    #[serde(rename = "2-3 per day")]
    DailyTwoToThree,
    #[serde(rename = "4+ per day")]
    DailyFourPlus,
}

impl FrequencyCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrequencyCategory::Never => "never",
            FrequencyCategory::MonthlyOneToThree => "1-3 per month",
            FrequencyCategory::WeeklyOnce => "1 per week",
            FrequencyCategory::WeeklyTwoToFour => "2-4 per week",
            FrequencyCategory::DailyOnce => "1 per day",
            FrequencyCategory::DailyTwoToThree => "2-3 per day",
            FrequencyCategory::DailyFourPlus => "4+ per day",
        }
    }
}

impl fmt::Display for FrequencyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrequencyCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "never" => Ok(FrequencyCategory::Never),
            "1-3 per month" => Ok(FrequencyCategory::MonthlyOneToThree),
            "1 per week" => Ok(FrequencyCategory::WeeklyOnce),
            "2-4 per week" => Ok(FrequencyCategory::WeeklyTwoToFour),
            "1 per day" => Ok(FrequencyCategory::DailyOnce),
            "2-3 per day" => Ok(FrequencyCategory::DailyTwoToThree),
            "4+ per day" => Ok(FrequencyCategory::DailyFourPlus),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

/// The parts of a question the aggregator looks at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRef {
    pub text: String,
    #[serde(default)]
    pub display_order: Option<i32>,
}

/// One answer of a submission, joined with its question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QuestionnaireAnswer {
    #[serde(default)]
    pub question: Option<QuestionRef>,
    #[serde(default)]
    pub days_per_week: Option<i32>,
    #[serde(default)]
    pub met_minutes: Option<f64>,
    #[serde(default)]
    pub frequency: Option<FrequencyCategory>,
}

impl QuestionnaireAnswer {
    fn display_order(&self) -> i32 {
        self.question
            .as_ref()
            .and_then(|q| q.display_order)
            .unwrap_or(0)
    }

    fn question_text(&self) -> &str {
        self.question.as_ref().map(|q| q.text.as_str()).unwrap_or("")
    }

    /// Zero counts as not answered
    fn days(&self) -> Option<Decimal> {
        self.days_per_week
            .filter(|d| *d != 0)
            .map(Decimal::from)
    }

    /// Zero and non-finite values count as not answered
    fn met(&self) -> Met {
        match self.met_minutes {
            Some(m) if m.is_finite() && m != 0.0 => match Decimal::try_from(m) {
                Ok(value) => Met::Value(value),
                Err(_) => Met::OutOfRange,
            },
            _ => Met::Absent,
        }
    }
}

/// Case-insensitive substring matcher for sitting-time questions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SedentaryMatcher {
    phrases: Vec<String>,
}

impl Default for SedentaryMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SEDENTARY_PHRASES.iter().copied())
    }
}

impl SedentaryMatcher {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn is_sedentary(&self, question_text: &str) -> bool {
        let text = question_text.to_lowercase();
        self.phrases.iter().any(|p| text.contains(p.as_str()))
    }
}

/// Outcome of aggregating one submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ActivityAggregate {
    pub total_met_minutes: f64,
    pub sedentary_answers: usize,
    pub paired_answers: usize,
    pub skipped_answers: usize,
    /// Answers dropped because their contribution exceeds the decimal range
    #[serde(default)]
    pub overflowed_answers: usize,
}

enum Met {
    Absent,
    Value(Decimal),
    OutOfRange,
}

enum Step {
    Sedentary(Decimal),
    Pair(Decimal),
    Overflow(usize),
    Skip,
}

impl Step {
    fn consumed(&self) -> usize {
        match self {
            Step::Pair(_) => 2,
            Step::Overflow(consumed) => *consumed,
            Step::Sedentary(_) | Step::Skip => 1,
        }
    }
}

fn classify(
    current: &QuestionnaireAnswer,
    next: Option<&QuestionnaireAnswer>,
    matcher: &SedentaryMatcher,
) -> Step {
    if matcher.is_sedentary(current.question_text()) {
        match current.met() {
            Met::Value(daily) => {
                return daily
                    .checked_mul(Decimal::from(DAYS_PER_WEEK))
                    .map_or(Step::Overflow(1), Step::Sedentary);
            }
            Met::OutOfRange => return Step::Overflow(1),
            Met::Absent => {}
        }
    }

    let Some(days) = current.days() else {
        return Step::Skip;
    };
    match next.map(QuestionnaireAnswer::met) {
        Some(Met::Value(met)) => days.checked_mul(met).map_or(Step::Overflow(2), Step::Pair),
        Some(Met::OutOfRange) => Step::Overflow(2),
        Some(Met::Absent) | None => Step::Skip,
    }
}

/// Aggregate a submission's answers into weekly MET-minutes
///
/// Answers are stably sorted by question display order (missing = 0). A
/// sitting-time answer contributes `met_minutes × 7`; an answer with
/// `days_per_week` followed by one with `met_minutes` contributes their
/// product and consumes both; anything else is skipped. A contribution that
/// does not fit in a `Decimal`, or would push the total past it, is dropped
/// with a warning and counted in `overflowed_answers`. This never panics.
pub fn aggregate_met_minutes(
    answers: &[QuestionnaireAnswer],
    matcher: &SedentaryMatcher,
) -> ActivityAggregate {
    let mut ordered: Vec<&QuestionnaireAnswer> = answers.iter().collect();
    ordered.sort_by_key(|a| a.display_order());

    let mut total = Decimal::ZERO;
    let mut aggregate = ActivityAggregate::default();
    let mut cursor = 0;

    while let Some(current) = ordered.get(cursor).copied() {
        let step = classify(current, ordered.get(cursor + 1).copied(), matcher);
        let contribution = match step {
            Step::Sedentary(value) | Step::Pair(value) => total.checked_add(value),
            Step::Overflow(_) | Step::Skip => None,
        };
        match (&step, contribution) {
            (Step::Sedentary(_), Some(sum)) => {
                total = sum;
                aggregate.sedentary_answers += 1;
            }
            (Step::Pair(_), Some(sum)) => {
                total = sum;
                aggregate.paired_answers += 2;
            }
            (Step::Sedentary(_) | Step::Pair(_) | Step::Overflow(_), _) => {
                warn!(
                    position = cursor,
                    question = current.question_text(),
                    "MET-minutes contribution out of range, answer dropped"
                );
                aggregate.overflowed_answers += step.consumed();
            }
            (Step::Skip, _) => {
                debug!(
                    position = cursor,
                    question = current.question_text(),
                    "answer not paired"
                );
                aggregate.skipped_answers += 1;
            }
        }
        cursor += step.consumed();
    }

    aggregate.total_met_minutes = total.to_f64().unwrap_or(0.0);
    aggregate
}

/// Weekly MET-minutes for a submission's answers
pub fn compute_met_minutes(answers: &[QuestionnaireAnswer], matcher: &SedentaryMatcher) -> f64 {
    aggregate_met_minutes(answers, matcher).total_met_minutes
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SITTING: &str = "Сколько времени в день вы обычно проводите сидя";

    fn answer(
        text: &str,
        order: i32,
        days_per_week: Option<i32>,
        met_minutes: Option<f64>,
    ) -> QuestionnaireAnswer {
        QuestionnaireAnswer {
            question: Some(QuestionRef {
                text: text.to_string(),
                display_order: Some(order),
            }),
            days_per_week,
            met_minutes,
            frequency: None,
        }
    }

    fn assert_total(answers: &[QuestionnaireAnswer], expected: f64) {
        let total = compute_met_minutes(answers, &SedentaryMatcher::default());
        assert!(
            (total - expected).abs() < 1e-9,
            "total {} != expected {}",
            total,
            expected
        );
    }

    #[test]
    fn test_sedentary_question_is_weighted_x7() {
        assert_total(&[answer(SITTING, 1, None, Some(1.2))], 8.4);
    }

    #[test]
    fn test_regular_pairing() {
        assert_total(
            &[
                answer("Сколько раз в неделю вы бегаете", 1, Some(3), None),
                answer("Сколько минут в день вы бегаете", 2, None, Some(2.5)),
            ],
            7.5,
        );
    }

    #[test]
    fn test_mixed_combination() {
        assert_total(
            &[
                answer("Сколько раз в неделю вы плаваете", 1, Some(2), None),
                answer("Сколько минут в день вы плаваете", 2, None, Some(3.0)),
                answer(SITTING, 3, None, Some(1.5)),
            ],
            16.5,
        );
    }

    #[test]
    fn test_answers_are_sorted_by_display_order() {
        assert_total(
            &[
                answer(SITTING, 3, None, Some(1.5)),
                answer("minutes swimming", 2, None, Some(3.0)),
                answer("days swimming", 1, Some(2), None),
            ],
            16.5,
        );
    }

    #[test]
    fn test_missing_order_sorts_first_and_ties_keep_input_order() {
        let mut unordered = answer("days walking", 0, Some(4), None);
        unordered.question.as_mut().unwrap().display_order = None;
        let aggregate = aggregate_met_minutes(
            &[
                answer("minutes walking", 0, None, Some(10.0)),
                unordered,
            ],
            &SedentaryMatcher::default(),
        );
        // Both sort to 0 and keep input order: the met answer comes first,
        // so nothing pairs
        assert_eq!(aggregate.total_met_minutes, 0.0);
        assert_eq!(aggregate.skipped_answers, 2);
    }

    #[test]
    fn test_sedentary_match_is_case_insensitive_substring() {
        let text = format!("2. {} (в будний день)?", SITTING.to_uppercase());
        assert_total(&[answer(&text, 1, None, Some(2.0))], 14.0);
    }

    #[test]
    fn test_sedentary_without_met_falls_through_to_pairing() {
        assert_total(
            &[
                answer(SITTING, 1, Some(5), None),
                answer("minutes", 2, None, Some(4.0)),
            ],
            20.0,
        );
    }

    #[test]
    fn test_frequency_without_following_intensity_is_skipped() {
        // days answer followed by another days answer: first skipped, second
        // pairs with the intensity after it
        let aggregate = aggregate_met_minutes(
            &[
                answer("days cycling", 1, Some(3), None),
                answer("days walking", 2, Some(5), None),
                answer("minutes walking", 3, None, Some(30.0)),
            ],
            &SedentaryMatcher::default(),
        );
        assert_eq!(aggregate.total_met_minutes, 150.0);
        assert_eq!(aggregate.skipped_answers, 1);
        assert_eq!(aggregate.paired_answers, 2);
    }

    #[test]
    fn test_trailing_frequency_is_skipped() {
        assert_total(&[answer("days running", 1, Some(3), None)], 0.0);
    }

    #[test]
    fn test_zero_values_count_as_unanswered() {
        assert_total(
            &[
                answer("days running", 1, Some(0), None),
                answer(SITTING, 2, None, Some(1.0)),
            ],
            7.0,
        );
        assert_total(
            &[
                answer("days running", 1, Some(3), None),
                answer("minutes running", 2, None, Some(0.0)),
            ],
            0.0,
        );
    }

    #[test]
    fn test_answer_without_question() {
        let orphan = QuestionnaireAnswer {
            days_per_week: Some(2),
            ..Default::default()
        };
        assert_total(&[orphan, answer("minutes", 1, None, Some(5.0))], 10.0);
    }

    #[test]
    fn test_multiple_sedentary_answers_all_count() {
        assert_total(
            &[
                answer(SITTING, 1, None, Some(1.0)),
                answer(SITTING, 2, None, Some(2.0)),
            ],
            21.0,
        );
    }

    #[test]
    fn test_custom_phrases() {
        let matcher = SedentaryMatcher::new(["time spent sitting"]);
        let answers = [answer("Total time spent sitting per day", 1, None, Some(3.0))];
        assert!((compute_met_minutes(&answers, &matcher) - 21.0).abs() < 1e-9);
        assert_eq!(compute_met_minutes(&answers, &SedentaryMatcher::default()), 0.0);
    }

    #[test]
    fn test_decimal_accumulation_has_no_drift() {
        let answers: Vec<_> = (0..100)
            .map(|i| answer(SITTING, i, None, Some(0.1)))
            .collect();
        assert_eq!(
            compute_met_minutes(&answers, &SedentaryMatcher::default()),
            70.0
        );
    }

    #[test]
    fn test_frequency_category_round_trip() {
        let parsed: FrequencyCategory = "2-4 per week".parse().unwrap();
        assert_eq!(parsed, FrequencyCategory::WeeklyTwoToFour);
        assert_eq!(
            serde_json::to_string(&FrequencyCategory::DailyFourPlus).unwrap(),
            "\"4+ per day\""
        );
        assert!("sometimes".parse::<FrequencyCategory>().is_err());
    }

    #[test]
    fn test_product_overflow_drops_pair() {
        let aggregate = aggregate_met_minutes(
            &[
                answer("days running", 1, Some(7), None),
                answer("minutes running", 2, None, Some(2e28)),
                answer(SITTING, 3, None, Some(1.0)),
            ],
            &SedentaryMatcher::default(),
        );
        assert_eq!(aggregate.total_met_minutes, 7.0);
        assert_eq!(aggregate.overflowed_answers, 2);
        assert_eq!(aggregate.sedentary_answers, 1);
    }

    #[test]
    fn test_unrepresentable_met_is_counted_as_overflow() {
        let aggregate = aggregate_met_minutes(
            &[answer(SITTING, 1, None, Some(1e30))],
            &SedentaryMatcher::default(),
        );
        assert_eq!(aggregate.total_met_minutes, 0.0);
        assert_eq!(aggregate.overflowed_answers, 1);
        assert_eq!(aggregate.skipped_answers, 0);

        let paired = aggregate_met_minutes(
            &[
                answer("days running", 1, Some(2), None),
                answer("minutes running", 2, None, Some(f64::MAX)),
            ],
            &SedentaryMatcher::default(),
        );
        assert_eq!(paired.overflowed_answers, 2);
    }

    #[test]
    fn test_running_total_overflow_keeps_earlier_sum() {
        // 1e28 x 7 fits, a second one would push the total past Decimal::MAX
        let aggregate = aggregate_met_minutes(
            &[
                answer(SITTING, 1, None, Some(1e28)),
                answer(SITTING, 2, None, Some(1e28)),
            ],
            &SedentaryMatcher::default(),
        );
        assert_eq!(aggregate.sedentary_answers, 1);
        assert_eq!(aggregate.overflowed_answers, 1);
        assert!((aggregate.total_met_minutes - 7e28).abs() / 7e28 < 1e-9);
    }

    #[test]
    fn test_largest_accepted_answer_is_exact() {
        // Upper bound accepted by answer validation
        let aggregate = aggregate_met_minutes(
            &[
                answer("days running", 1, Some(7), None),
                answer("minutes running", 2, None, Some(99_999_999.99)),
            ],
            &SedentaryMatcher::default(),
        );
        assert_eq!(aggregate.overflowed_answers, 0);
        assert!((aggregate.total_met_minutes - 699_999_999.93).abs() < 1e-3);
    }

    fn unmatched_answer() -> impl Strategy<Value = QuestionnaireAnswer> {
        (0i32..20, prop::option::of(0.1f64..500.0)).prop_map(|(order, met)| QuestionnaireAnswer {
            question: Some(QuestionRef {
                text: format!("question {}", order),
                display_order: Some(order),
            }),
            days_per_week: None,
            met_minutes: met,
            frequency: None,
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: arbitrary magnitudes never panic and stay accounted
        #[test]
        fn prop_extreme_values_never_panic(
            days in prop::collection::vec(prop::option::of(1i32..8), 0..8),
            mets in prop::collection::vec(prop::option::of(prop::num::f64::ANY), 8)
        ) {
            let mut answers: Vec<_> = days
                .iter()
                .zip(mets.iter())
                .enumerate()
                .map(|(i, (d, m))| answer("activity", i as i32, *d, *m))
                .collect();
            answers.push(answer(SITTING, 99, None, mets.first().copied().flatten()));
            let aggregate = aggregate_met_minutes(&answers, &SedentaryMatcher::default());
            prop_assert!(aggregate.total_met_minutes.is_finite());
        }

        /// Property: answers with no frequency and no sitting question score 0
        #[test]
        fn prop_unmatched_answers_score_zero(
            answers in prop::collection::vec(unmatched_answer(), 0..12)
        ) {
            prop_assert_eq!(compute_met_minutes(&answers, &SedentaryMatcher::default()), 0.0);
        }

        /// Property: every answer is counted exactly once
        #[test]
        fn prop_every_answer_accounted(
            days in prop::collection::vec(prop::option::of(1i32..8), 0..12),
            mets in prop::collection::vec(prop::option::of(1.0f64..300.0), 12)
        ) {
            let answers: Vec<_> = days
                .iter()
                .zip(mets.iter())
                .enumerate()
                .map(|(i, (d, m))| answer("activity", i as i32, *d, *m))
                .collect();
            let aggregate = aggregate_met_minutes(&answers, &SedentaryMatcher::default());
            prop_assert_eq!(
                aggregate.sedentary_answers
                    + aggregate.paired_answers
                    + aggregate.skipped_answers
                    + aggregate.overflowed_answers,
                answers.len()
            );
            prop_assert!(aggregate.total_met_minutes >= 0.0);
        }
    }
}
