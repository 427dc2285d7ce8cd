//! Nutriform Shared Library
//!
//! Clinical formulas, the body-metrics calculator and the MET-minutes
//! aggregator, plus the models and request types shared by the backend and
//! WASM modules.

pub mod activity;
pub mod errors;
pub mod formulas;
pub mod metrics;
pub mod models;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use activity::{
    aggregate_met_minutes, compute_met_minutes, ActivityAggregate, FrequencyCategory, QuestionRef,
    QuestionnaireAnswer, SedentaryMatcher,
};
pub use errors::*;
pub use formulas::*;
pub use metrics::*;
pub use models::*;
pub use types::*;
