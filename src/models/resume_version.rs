// src/models/resume_version.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stage sequence for one generation request. Linear, monotonic; `Failed`
/// is terminal and reachable from any non-terminal state. The edit loop
/// replaces the artifact of a `Complete` version without a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Processing,
    Optimizing,
    Finalizing,
    Complete,
    Failed,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Processing => "processing",
            GenerationStatus::Optimizing => "optimizing",
            GenerationStatus::Finalizing => "finalizing",
            GenerationStatus::Complete => "complete",
            GenerationStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "processing" => Some(GenerationStatus::Processing),
            "optimizing" => Some(GenerationStatus::Optimizing),
            "finalizing" => Some(GenerationStatus::Finalizing),
            "complete" => Some(GenerationStatus::Complete),
            "failed" => Some(GenerationStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationStatus::Complete | GenerationStatus::Failed)
    }

    /// Whether a transition to `next` is legal from this state.
    pub fn can_transition(&self, next: GenerationStatus) -> bool {
        use GenerationStatus::*;
        match (self, next) {
            (Processing, Optimizing) => true,
            (Optimizing, Finalizing) => true,
            (Finalizing, Complete) => true,
            (Processing | Optimizing | Finalizing, Failed) => true,
            _ => false,
        }
    }
}

/// Snapshot of the user's contact details captured at generation time.
/// Deliberately not live-linked to the profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeVersion {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_posting_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_application_id: Option<String>,
    pub personal_info: PersonalInfo,
    pub job_title: String,
    pub company: String,
    pub status: GenerationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latex_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResumeVersion {
    /// Invariant from the data model: a PDF reference exists iff the
    /// version is complete.
    pub fn artifact_invariant_holds(&self) -> bool {
        self.pdf_key.is_some() == (self.status == GenerationStatus::Complete)
    }
}
