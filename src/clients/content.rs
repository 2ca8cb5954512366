// src/clients/content.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use crate::clients::profile::ProfileData;
use crate::models::PersonalInfo;

const OPTIMIZE_ENDPOINT: &str = "/optimize-resume";
const EXTRACT_POSTING_ENDPOINT: &str = "/extract-posting";

/// Tailored resume content returned by the content-generation service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizedContent {
    pub summary: String,
    pub experiences: Vec<OptimizedExperience>,
    #[serde(default)]
    pub highlighted_skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizedExperience {
    pub role: String,
    pub company: String,
    pub period: String,
    pub bullets: Vec<String>,
}

/// Structured job data extracted from raw page text by the AI fallback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedPosting {
    pub title: String,
    pub company: String,
    pub description: String,
    /// Provider-reported; absent means the caller applies its default.
    pub confidence: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct OptimizeRequest<'a> {
    pub personal_info: &'a PersonalInfo,
    pub profile: &'a ProfileData,
    pub job_title: &'a str,
    pub company: &'a str,
    pub job_description: &'a str,
    pub keywords: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct OptimizeResponse {
    content: OptimizedContent,
    status: String,
}

#[derive(Debug, Deserialize)]
struct ExtractPostingResponse {
    posting: ExtractedPosting,
    status: String,
}

/// Seam for the content-generation collaborator
#[async_trait]
pub trait ContentProvider: Send + Sync {
    async fn optimize(&self, request: OptimizeRequest<'_>) -> Result<OptimizedContent>;

    /// AI-assisted extraction of title/company/description from page text
    async fn extract_posting(&self, page_text: &str, url: &str) -> Result<ExtractedPosting>;
}

pub struct ContentClient {
    client: reqwest::Client,
    base_url: String,
}

impl ContentClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    async fn post_json<T, R>(&self, endpoint: &str, payload: &T) -> Result<R>
    where
        T: serde::Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .with_context(|| format!("Failed to POST to {}", url))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<R>()
                .await
                .context("Failed to parse JSON response")
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Content service returned {}: {}", status, error_text)
        }
    }
}

#[async_trait]
impl ContentProvider for ContentClient {
    async fn optimize(&self, request: OptimizeRequest<'_>) -> Result<OptimizedContent> {
        info!(
            "Calling content service for optimization: {} at {}",
            request.job_title, request.company
        );

        let response: OptimizeResponse = self.post_json(OPTIMIZE_ENDPOINT, &request).await?;
        if response.status != "success" {
            anyhow::bail!("Content optimization failed: {}", response.status);
        }
        Ok(response.content)
    }

    async fn extract_posting(&self, page_text: &str, url: &str) -> Result<ExtractedPosting> {
        let payload = serde_json::json!({
            "page_text": page_text,
            "url": url,
        });

        let response: ExtractPostingResponse =
            self.post_json(EXTRACT_POSTING_ENDPOINT, &payload).await?;
        if response.status != "success" {
            anyhow::bail!("AI extraction failed: {}", response.status);
        }
        Ok(response.posting)
    }
}
