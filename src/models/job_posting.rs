// src/models/job_posting.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingStatus {
    Pending,
    Fetched,
    Failed,
}

impl PostingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostingStatus::Pending => "pending",
            PostingStatus::Fetched => "fetched",
            PostingStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PostingStatus::Pending),
            "fetched" => Some(PostingStatus::Fetched),
            "failed" => Some(PostingStatus::Failed),
            _ => None,
        }
    }
}

/// How a posting's structured fields were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    DomainSelector,
    Heuristic,
    Ai,
    Manual,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::DomainSelector => "domain_selector",
            ExtractionMethod::Heuristic => "heuristic",
            ExtractionMethod::Ai => "ai",
            ExtractionMethod::Manual => "manual",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "domain_selector" => Some(ExtractionMethod::DomainSelector),
            "heuristic" => Some(ExtractionMethod::Heuristic),
            "ai" => Some(ExtractionMethod::Ai),
            "manual" => Some(ExtractionMethod::Manual),
            _ => None,
        }
    }
}

/// Metadata describing how extracted data was produced. Present exactly
/// when the posting status is `fetched`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub method: ExtractionMethod,
    pub extractor: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub extracted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub title: String,
    pub company: String,
    pub description: String,
    pub status: PostingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row per extraction strategy tried, in chronological order.
/// Append-only; never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FetchAttempt {
    pub id: i64,
    pub job_posting_id: String,
    pub method: String,
    pub http_status: Option<i64>,
    pub duration_ms: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_round_trip() {
        for method in [
            ExtractionMethod::DomainSelector,
            ExtractionMethod::Heuristic,
            ExtractionMethod::Ai,
            ExtractionMethod::Manual,
        ] {
            assert_eq!(ExtractionMethod::parse(method.as_str()), Some(method));
        }
        assert_eq!(ExtractionMethod::parse("scraper"), None);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&PostingStatus::Fetched).unwrap();
        assert_eq!(json, r#""fetched""#);
    }
}
