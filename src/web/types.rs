// src/web/types.rs
use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::{Request, Response};

use crate::error::PipelineError;
use crate::generation::keywords::KeywordEntry;
use crate::models::PersonalInfo;

pub struct PdfResponse {
    pub data: Vec<u8>,
    pub filename: Option<String>,
}

impl PdfResponse {
    pub fn with_filename(data: Vec<u8>, filename: String) -> Self {
        Self {
            data,
            filename: Some(filename),
        }
    }
}

impl<'r> Responder<'r, 'static> for PdfResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let mut binding = Response::build();
        let mut response = binding
            .header(ContentType::PDF)
            .sized_body(self.data.len(), std::io::Cursor::new(self.data));

        if let Some(filename) = self.filename {
            response = response.raw_header(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", filename),
            );
        }

        response.ok()
    }
}

/// PDF fetch outcome: the artifact, or 202 while generation is running.
#[derive(rocket::Responder)]
pub enum PdfFetch {
    Ready(PdfResponse),
    #[response(status = 202)]
    Pending(Json<TextResponse>),
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum ResponseType {
    Text,
    Data,
    Error,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct TextResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DataResponse<T> {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub data: T,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
    /// Compiler diagnostics, present only on compilation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

impl TextResponse {
    pub fn success(message: String) -> Self {
        Self {
            response_type: ResponseType::Text,
            success: true,
            message,
        }
    }
}

impl<T> DataResponse<T> {
    pub fn success(message: String, data: T) -> Self {
        Self {
            response_type: ResponseType::Data,
            success: true,
            message,
            data,
        }
    }
}

impl StandardErrorResponse {
    pub fn new(error: String, error_code: String, suggestions: Vec<String>) -> Self {
        Self {
            response_type: ResponseType::Error,
            success: false,
            error,
            error_code,
            suggestions,
            log: None,
        }
    }
}

/// Error envelope plus the HTTP status it should travel with.
pub struct ApiError {
    pub status: Status,
    pub body: StandardErrorResponse,
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let mut response = Json(self.body).respond_to(request)?;
        response.set_status(self.status);
        Ok(response)
    }
}

impl From<PipelineError> for ApiError {
    fn from(error: PipelineError) -> Self {
        let status = match &error {
            PipelineError::NotFound(_) => Status::NotFound,
            PipelineError::Validation(_) => Status::BadRequest,
            PipelineError::InvalidState(_) | PipelineError::StillInProgress(_) => {
                Status::Conflict
            }
            PipelineError::Compilation { .. } => Status::UnprocessableEntity,
            PipelineError::ExtractionFailed(_) | PipelineError::StageFailed { .. } => {
                Status::BadGateway
            }
            PipelineError::Database(_) | PipelineError::Internal(_) => {
                Status::InternalServerError
            }
        };

        let suggestions = match &error {
            PipelineError::NotFound(_) => vec![
                "Check the id in the request path".to_string(),
            ],
            PipelineError::Validation(_) => vec![
                "Check your request JSON format".to_string(),
                "Verify all required fields are present".to_string(),
            ],
            PipelineError::InvalidState(_) => vec![
                "Fetch the current status before retrying".to_string(),
            ],
            PipelineError::Compilation { .. } => vec![
                "Fix the LaTeX error reported in the log".to_string(),
                "The previous compiled version is still available".to_string(),
            ],
            _ => vec!["Try again in a few moments".to_string()],
        };

        let log = match &error {
            PipelineError::Compilation { log, .. } => Some(log.clone()),
            _ => None,
        };

        let mut body = StandardErrorResponse::new(
            error.to_string(),
            error.error_code().to_string(),
            suggestions,
        );
        body.log = log;

        Self { status, body }
    }
}

// ===== Request types =====

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct FetchPostingRequest {
    pub url: String,
    /// Where the user found the posting (surface tag, informational).
    pub source: Option<String>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct CreatePostingRequest {
    pub title: String,
    pub company: String,
    pub description: String,
    pub url: Option<String>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct DesignRequest {
    pub user_id: String,
    pub personal_info: PersonalInfo,
    pub job_posting_id: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub job_description: Option<String>,
    pub linked_application_id: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub locale: Option<String>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct UpdateLatexRequest {
    pub latex_content: String,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct AnalyzeKeywordsRequest {
    pub job_description: Option<String>,
    pub job_posting_id: Option<String>,
    /// Skill inventory to diff against; omitted means rank-only.
    pub skills: Option<Vec<String>>,
}

// ===== Response data =====

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct KeywordAnalysisData {
    pub keywords: Vec<KeywordEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub present: Option<Vec<KeywordEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<KeywordEntry>>,
}
