//! Configuration management for the Nutriform backend
//!
//! Configuration is loaded hierarchically:
//! 1. Default values (in code)
//! 2. TOML config files (config/development.toml or config/production.toml)
//! 3. Environment variables (prefix: NF__)

use anyhow::Result;
use nutriform_shared::activity::DEFAULT_SEDENTARY_PHRASES;
use nutriform_shared::{BmrMethod, BsaMethod, CalculatorOptions, IdealWeightMethod, SedentaryMatcher};
use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub calculator: CalculatorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Formula selection and questionnaire matching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorConfig {
    pub bsa_method: BsaMethod,
    pub bmr_method: BmrMethod,
    pub ideal_weight_method: IdealWeightMethod,
    /// Question phrases that mark a daily sitting-time answer
    pub sedentary_phrases: Vec<String>,
    /// Window used for the weight-loss risk assessment
    pub weight_loss_window_months: u32,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            bsa_method: BsaMethod::default(),
            bmr_method: BmrMethod::default(),
            ideal_weight_method: IdealWeightMethod::default(),
            sedentary_phrases: DEFAULT_SEDENTARY_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            weight_loss_window_months: 3,
        }
    }
}

impl CalculatorConfig {
    pub fn options(&self) -> CalculatorOptions {
        CalculatorOptions {
            bsa_method: self.bsa_method,
            bmr_method: self.bmr_method,
            ideal_weight_method: self.ideal_weight_method,
        }
    }

    pub fn sedentary_matcher(&self) -> SedentaryMatcher {
        SedentaryMatcher::new(&self.sedentary_phrases)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is unset
    pub filter: Option<String>,
    /// Force JSON output outside production
    pub json: bool,
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Loading order (later sources override earlier):
    /// 1. Default values
    /// 2. Config file based on RUST_ENV (development.toml or production.toml)
    /// 3. Environment variables with NF__ prefix
    pub fn load() -> Result<Self> {
        let env = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        let config_file = format!("config/{}.toml", env);

        let config = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name(&config_file).required(false))
            // e.g., NF__CALCULATOR__BSA_METHOD=shuter_aslani sets calculator.bsa_method
            .add_source(config::Environment::with_prefix("NF").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Load from an explicit TOML file on top of the defaults
    pub fn from_file(path: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::new(path, config::FileFormat::Toml))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Check if running in production mode
    pub fn is_production() -> bool {
        env::var("RUST_ENV")
            .map(|v| v == "production")
            .unwrap_or(false)
    }
}
