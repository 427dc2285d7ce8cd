//! Business logic services
//!
//! Services validate input, coordinate the repositories and run the
//! calculators whenever a measurement or an answer set is written.

pub mod body_metrics;
pub mod doctors;
pub mod patients;
pub mod profile_change;
pub mod questionnaire;

pub use body_metrics::{BodyMetricsService, RecordedMeasurement};
pub use doctors::DoctorService;
pub use patients::PatientService;
pub use profile_change::ProfileChangeService;
pub use questionnaire::QuestionnaireService;
