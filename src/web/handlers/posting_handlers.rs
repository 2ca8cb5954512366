// src/web/handlers/posting_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

use crate::models::{DomainSelector, FetchAttempt, JobPosting};
use crate::repository::{PostingRepository, SelectorRepository};
use crate::utils::domain_from_url;
use crate::web::services::AppServices;
use crate::web::types::{ApiError, CreatePostingRequest, DataResponse, FetchPostingRequest};
use crate::error::PipelineError;

/// Accept a posting URL and kick off extraction. The response carries the
/// pending posting; progress arrives over the status stream.
pub async fn fetch_posting_handler(
    request: Json<FetchPostingRequest>,
    services: &State<AppServices>,
) -> Result<Json<DataResponse<JobPosting>>, ApiError> {
    info!(
        "Fetch requested for {} (source: {})",
        request.url,
        request.source.as_deref().unwrap_or("unspecified")
    );

    let posting = services.engine.fetch(&request.url).await?;

    Ok(Json(DataResponse::success(
        "Extraction started".to_string(),
        posting,
    )))
}

/// Manual posting entry: the user pasted the job data themselves.
pub async fn create_posting_handler(
    request: Json<CreatePostingRequest>,
    services: &State<AppServices>,
) -> Result<Json<DataResponse<JobPosting>>, ApiError> {
    if request.title.trim().is_empty()
        || request.company.trim().is_empty()
        || request.description.trim().is_empty()
    {
        return Err(PipelineError::Validation(
            "title, company and description must not be empty".to_string(),
        )
        .into());
    }

    let domain = request
        .url
        .as_deref()
        .and_then(|url| domain_from_url(url).ok());

    let posting = PostingRepository::new(&services.pool)
        .create_manual(
            &request.title,
            &request.company,
            &request.description,
            request.url.as_deref(),
            domain.as_deref(),
        )
        .await
        .map_err(PipelineError::Internal)?;

    Ok(Json(DataResponse::success(
        "Posting created".to_string(),
        posting,
    )))
}

pub async fn get_posting_handler(
    id: &str,
    services: &State<AppServices>,
) -> Result<Json<DataResponse<JobPosting>>, ApiError> {
    let posting = PostingRepository::new(&services.pool)
        .find_by_id(id)
        .await
        .map_err(PipelineError::Internal)?
        .ok_or_else(|| PipelineError::NotFound(format!("job posting {}", id)))?;

    Ok(Json(DataResponse::success(
        "Posting retrieved".to_string(),
        posting,
    )))
}

/// The extraction audit trail: one row per strategy tried.
pub async fn list_attempts_handler(
    id: &str,
    services: &State<AppServices>,
) -> Result<Json<DataResponse<Vec<FetchAttempt>>>, ApiError> {
    let repo = PostingRepository::new(&services.pool);

    repo.find_by_id(id)
        .await
        .map_err(PipelineError::Internal)?
        .ok_or_else(|| PipelineError::NotFound(format!("job posting {}", id)))?;

    let attempts = repo
        .attempts_for(id)
        .await
        .map_err(PipelineError::Internal)?;

    Ok(Json(DataResponse::success(
        "Fetch attempts retrieved".to_string(),
        attempts,
    )))
}

pub async fn list_selectors_handler(
    services: &State<AppServices>,
) -> Result<Json<DataResponse<Vec<DomainSelector>>>, ApiError> {
    let selectors = SelectorRepository::new(&services.pool)
        .list()
        .await
        .map_err(PipelineError::Internal)?;

    Ok(Json(DataResponse::success(
        "Domain selectors retrieved".to_string(),
        selectors,
    )))
}
