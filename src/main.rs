// src/main.rs
use anyhow::{Context, Result};
use resume_pipeline::web::start_web_server;
use resume_pipeline::{EnvironmentConfig, TimeoutConfig};
use std::fs::OpenOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Console logging always; JSON file logging when a path is configured.
    let file_layer = match std::env::var("RESUMEFORGE_LOG_FILE") {
        Ok(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file: {}", path))?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(file)
                    .with_current_span(false)
                    .with_span_list(false),
            )
        }
        Err(_) => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(file_layer)
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or(EnvFilter::new("resume_pipeline=info,rocket::server=off")),
        )
        .init();

    let environment = EnvironmentConfig::load()?;
    let timeouts = TimeoutConfig::load();

    start_web_server(environment, timeouts).await
}
