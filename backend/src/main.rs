//! Nutriform batch runner
//!
//! Reads a JSON batch (questions, patients, measurements, questionnaire
//! submissions) from the file given as the first argument, or from stdin
//! when the argument is missing or `-`, and prints the derived body metrics
//! and MET-minutes scores as JSON on stdout. Logs go to stderr.

use anyhow::{Context, Result};
use nutriform_backend::{batch, config, repositories::InMemoryStore, state::AppState};
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = config::AppConfig::load()?;
    init_tracing(&config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if config::AppConfig::is_production() { "production" } else { "development" },
        bsa_method = config.calculator.bsa_method.label(),
        bmr_method = config.calculator.bmr_method.label(),
        "Starting Nutriform batch run"
    );

    let source = std::env::args().nth(1);
    let raw = read_input(source.as_deref()).await?;
    let input: batch::BatchInput =
        serde_json::from_str(&raw).context("Batch input is not a valid batch document")?;

    let state = AppState::new(InMemoryStore::new(), config);
    let report = batch::run_batch(&state, input).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn read_input(source: Option<&str>) -> Result<String> {
    match source {
        None | Some("-") => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("Failed to read batch from stdin")?;
            Ok(raw)
        }
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read batch file {}", path)),
    }
}

/// Initialize tracing/logging
fn init_tracing(logging: &config::LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if let Some(filter) = &logging.filter {
            filter.as_str().into()
        } else if config::AppConfig::is_production() {
            "nutriform_backend=info,nutriform_shared=info".into()
        } else {
            "nutriform_backend=debug,nutriform_shared=debug".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config::AppConfig::is_production() || logging.json {
        // JSON logging for production (better for log aggregation)
        subscriber
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }
}
