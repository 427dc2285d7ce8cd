//! Application state management
//!
//! Holds the store together with everything derived from configuration
//! once at startup: calculator options and the sedentary-question matcher.
//! All fields are cheap to clone.

use crate::config::AppConfig;
use crate::repositories::InMemoryStore;
use nutriform_shared::{CalculatorOptions, SedentaryMatcher};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Record store; clones share the same tables
    pub store: InMemoryStore,
    pub config: Arc<AppConfig>,
    pub options: CalculatorOptions,
    pub matcher: Arc<SedentaryMatcher>,
}

impl AppState {
    pub fn new(store: InMemoryStore, config: AppConfig) -> Self {
        let options = config.calculator.options();
        let matcher = Arc::new(config.calculator.sedentary_matcher());

        Self {
            store,
            config: Arc::new(config),
            options,
            matcher,
        }
    }

    #[inline]
    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[inline]
    pub fn options(&self) -> &CalculatorOptions {
        &self.options
    }

    #[inline]
    pub fn matcher(&self) -> &SedentaryMatcher {
        &self.matcher
    }
}
