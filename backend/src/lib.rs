//! Nutriform Backend Library
//!
//! Service layer over the shared calculators: repositories, services and
//! the batch runner used by the `nutriform` binary and the integration tests.

pub mod batch;
pub mod config;
pub mod error;
pub mod repositories;
pub mod services;
pub mod state;
