// src/web/handlers/resume_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

use crate::error::PipelineError;
use crate::generation::GenerationRequest;
use crate::models::{PostingStatus, ResumeVersion};
use crate::repository::{PostingRepository, VersionRepository};
use crate::web::services::AppServices;
use crate::web::types::{
    AnalyzeKeywordsRequest, ApiError, DataResponse, DesignRequest, KeywordAnalysisData,
    PdfFetch, PdfResponse, TextResponse, UpdateLatexRequest,
};

/// Accept a design request and start the generation pipeline. The caller
/// gets the `processing` version back immediately and follows progress
/// over the status stream.
pub async fn design_handler(
    request: Json<DesignRequest>,
    services: &State<AppServices>,
) -> Result<Json<DataResponse<ResumeVersion>>, ApiError> {
    let request = request.into_inner();
    info!("Design requested by user {}", request.user_id);

    let version = services
        .generator
        .submit(GenerationRequest {
            user_id: request.user_id,
            personal_info: request.personal_info,
            job_posting_id: request.job_posting_id,
            job_title: request.job_title,
            company: request.company,
            job_description: request.job_description,
            linked_application_id: request.linked_application_id,
            keywords: request.keywords,
            locale: request.locale,
        })
        .await?;

    Ok(Json(DataResponse::success(
        "Resume generation started".to_string(),
        version,
    )))
}

pub async fn get_version_handler(
    id: &str,
    services: &State<AppServices>,
) -> Result<Json<DataResponse<ResumeVersion>>, ApiError> {
    let version = VersionRepository::new(&services.pool)
        .find_by_id(id)
        .await
        .map_err(PipelineError::Internal)?
        .ok_or_else(|| PipelineError::NotFound(format!("resume version {}", id)))?;

    Ok(Json(DataResponse::success(
        "Resume version retrieved".to_string(),
        version,
    )))
}

/// The compiled artifact. While generation is still running this answers
/// 202 with the current stage instead of an error.
pub async fn get_pdf_handler(
    id: &str,
    services: &State<AppServices>,
) -> Result<PdfFetch, ApiError> {
    match services.generator.fetch_pdf(id).await {
        Ok(data) => Ok(PdfFetch::Ready(PdfResponse::with_filename(
            data,
            format!("resume-{}.pdf", id),
        ))),
        Err(PipelineError::StillInProgress(status)) => {
            Ok(PdfFetch::Pending(Json(TextResponse::success(format!(
                "Resume generation in progress (status: {})",
                status
            )))))
        }
        Err(e) => Err(e.into()),
    }
}

/// Raw LaTeX source of a complete version, for the editor.
pub async fn get_latex_handler(
    id: &str,
    services: &State<AppServices>,
) -> Result<String, ApiError> {
    Ok(services.generator.latex_source(id).await?)
}

/// Edit loop: recompile the submitted LaTeX, swap the artifact, answer
/// with the new PDF. A compile failure answers 422 with the diagnostic
/// log and leaves the stored version untouched.
pub async fn update_latex_handler(
    id: &str,
    request: Json<UpdateLatexRequest>,
    services: &State<AppServices>,
) -> Result<PdfResponse, ApiError> {
    if request.latex_content.trim().is_empty() {
        return Err(
            PipelineError::Validation("latex_content must not be empty".to_string()).into(),
        );
    }

    services
        .generator
        .recompile(id, &request.latex_content)
        .await?;

    let data = services.generator.fetch_pdf(id).await?;
    Ok(PdfResponse::with_filename(
        data,
        format!("resume-{}.pdf", id),
    ))
}

/// Local keyword analysis, against a pasted description or a stored
/// posting; with a skill list the result is split into covered and
/// missing keywords.
pub async fn analyze_keywords_handler(
    request: Json<AnalyzeKeywordsRequest>,
    services: &State<AppServices>,
) -> Result<Json<DataResponse<KeywordAnalysisData>>, ApiError> {
    let description = match (&request.job_description, &request.job_posting_id) {
        (Some(description), _) if !description.trim().is_empty() => description.clone(),
        (_, Some(posting_id)) => {
            let posting = PostingRepository::new(&services.pool)
                .find_by_id(posting_id)
                .await
                .map_err(PipelineError::Internal)?
                .ok_or_else(|| {
                    PipelineError::NotFound(format!("job posting {}", posting_id))
                })?;
            match posting.status {
                PostingStatus::Fetched => posting.description,
                PostingStatus::Failed => {
                    return Err(PipelineError::ExtractionFailed(format!(
                        "job posting {} could not be extracted",
                        posting_id
                    ))
                    .into());
                }
                PostingStatus::Pending => {
                    return Err(PipelineError::InvalidState(format!(
                        "job posting {} is still pending extraction",
                        posting_id
                    ))
                    .into());
                }
            }
        }
        _ => {
            return Err(PipelineError::Validation(
                "either job_description or job_posting_id is required".to_string(),
            )
            .into());
        }
    };

    let data = match &request.skills {
        Some(skills) => {
            let split = services.analyzer.diff_against_skills(&description, skills);
            KeywordAnalysisData {
                keywords: services.analyzer.analyze(&description),
                present: Some(split.present),
                missing: Some(split.missing),
            }
        }
        None => KeywordAnalysisData {
            keywords: services.analyzer.analyze(&description),
            present: None,
            missing: None,
        },
    };

    Ok(Json(DataResponse::success(
        "Keywords analyzed".to_string(),
        data,
    )))
}
