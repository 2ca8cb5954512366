// src/error.rs
//! Error taxonomy for the extraction and generation pipeline.
//!
//! Internal plumbing uses `anyhow` with context; this enum is the seam the
//! HTTP layer maps onto error codes and status codes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Every extraction strategy was exhausted without a usable parse.
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    /// A generation stage's collaborator call errored or timed out.
    #[error("{stage} stage failed: {cause}")]
    StageFailed { stage: String, cause: String },

    /// LaTeX source did not compile.
    #[error("compilation failed: {message}")]
    Compilation { message: String, log: String },

    /// Transient condition: the requested artifact is not ready yet.
    #[error("resume generation still in progress (status: {0})")]
    StillInProgress(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    /// Operation is not valid for the entity's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PipelineError {
    /// Machine-readable code used in the standard error envelope.
    pub fn error_code(&self) -> &'static str {
        match self {
            PipelineError::ExtractionFailed(_) => "EXTRACTION_FAILED",
            PipelineError::StageFailed { .. } => "GENERATION_STAGE_FAILED",
            PipelineError::Compilation { .. } => "COMPILATION_FAILED",
            PipelineError::StillInProgress(_) => "STILL_IN_PROGRESS",
            PipelineError::NotFound(_) => "NOT_FOUND",
            PipelineError::Validation(_) => "VALIDATION_ERROR",
            PipelineError::InvalidState(_) => "INVALID_STATE",
            PipelineError::Database(_) => "DATABASE_ERROR",
            PipelineError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
