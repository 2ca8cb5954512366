// src/clients/profile.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use crate::retry::RetryPolicy;

/// The user's recorded career data, read from the profile CRUD services.
/// Eventually consistent with what the user entered in the UI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileData {
    #[serde(default)]
    pub experiences: Vec<ExperienceRecord>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub publications: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceRecord {
    pub role: String,
    pub company: String,
    pub period: String,
    #[serde(default)]
    pub highlights: Vec<String>,
}

/// Seam for the read-only profile collaborator
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profile(&self, user_id: &str) -> Result<ProfileData>;
}

pub struct ProfileClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl ProfileClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            // Profile reads are safe to repeat; transient failures get a
            // short doubling backoff before surfacing.
            retry: RetryPolicy::new(3, Duration::from_secs(1)),
        })
    }

    async fn fetch_once(&self, user_id: &str) -> Result<ProfileData> {
        let url = format!("{}/profiles/{}", self.base_url, user_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to GET {}", url))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<ProfileData>()
                .await
                .context("Failed to parse profile response")
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Profile service returned {}: {}", status, error_text)
        }
    }
}

#[async_trait]
impl ProfileSource for ProfileClient {
    async fn fetch_profile(&self, user_id: &str) -> Result<ProfileData> {
        info!("Fetching profile for user {}", user_id);
        self.retry
            .run("profile fetch", || self.fetch_once(user_id))
            .await
    }
}
