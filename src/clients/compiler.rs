// src/clients/compiler.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

const COMPILE_ENDPOINT: &str = "/compile";

/// Failure modes of a compile call. `Diagnostics` means the service ran
/// the compiler and the source was rejected; everything else is transport
/// or service trouble.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("LaTeX compilation failed: {message}")]
    Diagnostics { message: String, log: String },

    #[error("compiler service error: {0}")]
    Service(#[from] anyhow::Error),
}

#[derive(Debug, Deserialize)]
struct CompileDiagnostics {
    error: String,
    #[serde(default)]
    log: String,
}

/// Seam for the LaTeX-to-PDF compiler collaborator
#[async_trait]
pub trait LatexCompiler: Send + Sync {
    async fn compile(&self, source: &str) -> Result<Vec<u8>, CompileError>;
}

pub struct CompilerClient {
    client: reqwest::Client,
    base_url: String,
}

impl CompilerClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl LatexCompiler for CompilerClient {
    /// Sends LaTeX source, receives PDF bytes. A 422 carries the
    /// compiler's diagnostic log; anything else non-2xx is a service
    /// error.
    async fn compile(&self, source: &str) -> Result<Vec<u8>, CompileError> {
        let url = format!("{}{}", self.base_url, COMPILE_ENDPOINT);
        let payload = serde_json::json!({ "latex_source": source });

        info!("Calling compiler service: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Failed to call compiler service")?;

        let status = response.status();
        if status.is_success() {
            let bytes = response
                .bytes()
                .await
                .context("Failed to read PDF bytes")?;
            return Ok(bytes.to_vec());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            let diagnostics: CompileDiagnostics = serde_json::from_str(&body).unwrap_or_else(|_| {
                CompileDiagnostics {
                    error: "LaTeX compilation failed".to_string(),
                    log: body.clone(),
                }
            });
            return Err(CompileError::Diagnostics {
                message: diagnostics.error,
                log: diagnostics.log,
            });
        }

        Err(CompileError::Service(anyhow::anyhow!(
            "Compiler service returned {}: {}",
            status,
            body
        )))
    }
}
